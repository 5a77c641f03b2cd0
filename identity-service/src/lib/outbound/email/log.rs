use async_trait::async_trait;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::EmailSender;
use crate::user::errors::EmailDeliveryError;

/// Writes outgoing email to the log instead of delivering it.
///
/// Meant for local development, where the links can be copied from the
/// service output.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailDeliveryError> {
        tracing::info!(to = %to, subject, body, "Email not delivered (log transport)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let to = EmailAddress::new("alice@example.com".to_string()).unwrap();
        assert!(LogEmailSender
            .send(&to, "Subject", "Body")
            .await
            .is_ok());
    }
}
