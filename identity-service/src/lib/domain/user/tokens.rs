use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::models::IssuedToken;
use crate::domain::user::models::TokenEffect;
use crate::domain::user::models::TokenPurpose;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::IdentityServicePort;
use crate::user::ports::UserRepository;

/// How long each kind of single-use token stays valid.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub email_verification: Duration,
    pub password_reset: Duration,
}

impl TokenLifetimes {
    pub fn of(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::EmailVerification => self.email_verification,
            TokenPurpose::PasswordReset => self.password_reset,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            email_verification: Duration::hours(24),
            password_reset: Duration::hours(1),
        }
    }
}

/// Issues and consumes the single-use email verification and password reset tokens.
///
/// Consumption is delegated to the store as one conditional update, so a
/// token can authorize its effect at most once.
pub struct VerificationTokens<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    lifetimes: TokenLifetimes,
}

impl<UR> VerificationTokens<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>, lifetimes: TokenLifetimes) -> Self {
        Self {
            repository,
            lifetimes,
        }
    }

    pub fn lifetime(&self, purpose: TokenPurpose) -> Duration {
        self.lifetimes.of(purpose)
    }

    /// Draw a new token for `purpose` without storing it.
    ///
    /// Used when the token is persisted together with the account it belongs to.
    pub fn prepare(&self, purpose: TokenPurpose, now: DateTime<Utc>) -> IssuedToken {
        IssuedToken::new(auth::onetime::generate(), now, self.lifetimes.of(purpose))
    }

    /// Issue a token for `purpose`, replacing any earlier one of the same kind.
    ///
    /// # Returns
    /// Updated user and the token value to hand out
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Store operation failed
    pub async fn issue(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
    ) -> Result<(User, String), UserError> {
        let now = Utc::now();
        let issued = self.prepare(purpose, now);
        let token = issued.token.clone();

        let user = self
            .repository
            .store_token(user_id, purpose, issued, now)
            .await?;

        tracing::debug!(user_id = %user.id, %purpose, "Single-use token issued");

        Ok((user, token))
    }

    /// Consume a token and apply `effect` in the same store operation.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Token never existed, was used, or expired
    /// * `DatabaseError` - Store operation failed
    pub async fn consume(
        &self,
        token: &str,
        purpose: TokenPurpose,
        effect: TokenEffect,
    ) -> Result<User, UserError> {
        if token.is_empty() {
            return Err(UserError::InvalidOrExpiredToken);
        }

        let user = self
            .repository
            .consume_token(purpose, token, effect, Utc::now())
            .await?
            .ok_or(UserError::InvalidOrExpiredToken)?;

        tracing::info!(user_id = %user.id, %purpose, "Single-use token consumed");

        Ok(user)
    }
}

/// Periodically clear expired token pairs.
///
/// Expired tokens are already unusable; this only keeps the store tidy.
pub fn spawn_cleanup(
    service: Arc<dyn IdentityServicePort>,
    period: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match service.purge_expired_tokens().await {
                Ok(0) => {}
                Ok(cleared) => tracing::info!(cleared, "Expired tokens purged"),
                Err(e) => tracing::error!(error = %e, "Expired token purge failed"),
            }
        }
    })
}
