use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::EmailSender;
use crate::user::errors::EmailDeliveryError;

/// Delivers email through a provider's JSON HTTP API.
///
/// Posts `{from, to, subject, text}` with the API key as bearer token;
/// any 2xx status counts as accepted.
#[derive(Debug, Clone)]
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpEmailSender {
    /// # Errors
    /// * `ConnectionFailed` - HTTP client could not be built
    pub fn new(config: &EmailConfig) -> Result<Self, EmailDeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EmailDeliveryError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailDeliveryError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&OutgoingEmail {
                from: &self.from,
                to: to.as_str(),
                subject,
                text: body,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmailDeliveryError::Timeout(e.to_string())
                } else {
                    EmailDeliveryError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %detail, "Email provider rejected message");
            return Err(EmailDeliveryError::Rejected(format!("{}: {}", status, detail)));
        }

        tracing::debug!(to = %to, subject, "Email accepted by provider");
        Ok(())
    }
}
