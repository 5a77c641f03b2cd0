pub mod http;
pub mod log;

pub use self::http::HttpEmailSender;
pub use self::log::LogEmailSender;
