use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::user::tokens::TokenLifetimes;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub tokens: TokensConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Argon2id cost parameters
#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&HashingConfig> for auth::HashingParams {
    fn from(config: &HashingConfig) -> Self {
        Self {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

/// Lifetimes of the single-use email tokens
#[derive(Debug, Deserialize, Clone)]
pub struct TokensConfig {
    pub email_verification_hours: i64,
    pub password_reset_minutes: i64,
    /// Interval of the expired-token purge; 0 disables it
    pub cleanup_interval_minutes: u64,
}

impl From<&TokensConfig> for TokenLifetimes {
    fn from(config: &TokensConfig) -> Self {
        Self {
            email_verification: chrono::Duration::hours(config.email_verification_hours),
            password_reset: chrono::Duration::minutes(config.password_reset_minutes),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Http,
    Log,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    /// Base URL used to build the links placed in emails
    pub public_base_url: String,
    pub timeout_seconds: u64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        // Example: DATABASE__URL=postgres://... overrides database.url
        Self::load_with(Environment::default().separator("__"))
    }

    fn load_with(environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment)
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        if config.jwt.secret.len() < 32 {
            return Err(ConfigError::Message(
                "jwt.secret must be at least 32 bytes".to_string(),
            ));
        }

        if config.tokens.email_verification_hours <= 0 || config.tokens.password_reset_minutes <= 0
        {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }

        if config.email.transport == EmailTransport::Http && config.email.api_key.is_empty() {
            return Err(ConfigError::Message(
                "email.api_key is required for the http transport".to_string(),
            ));
        }

        Ok(config)
    }
}
