use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::email::EmailMessage;
use crate::domain::user::email::LinkBuilder;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::ProfileChanges;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::ResetPasswordCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::TokenEffect;
use crate::domain::user::models::TokenPurpose;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::tokens::TokenLifetimes;
use crate::domain::user::tokens::VerificationTokens;
use crate::user::errors::UserError;
use crate::user::ports::EmailSender;
use crate::user::ports::IdentityServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for identity operations.
///
/// Hashing and timestamping are explicit steps here; the store only persists
/// what it is handed.
pub struct IdentityService<UR, ES>
where
    UR: UserRepository,
    ES: EmailSender,
{
    repository: Arc<UR>,
    email_sender: Arc<ES>,
    authenticator: Arc<Authenticator>,
    tokens: VerificationTokens<UR>,
    links: LinkBuilder,
}

impl<UR, ES> IdentityService<UR, ES>
where
    UR: UserRepository,
    ES: EmailSender,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `email_sender` - Outbound email implementation
    /// * `authenticator` - Password hashing and session token signing
    /// * `lifetimes` - Validity of verification and reset tokens
    /// * `links` - Builder for the links placed in emails
    pub fn new(
        repository: Arc<UR>,
        email_sender: Arc<ES>,
        authenticator: Arc<Authenticator>,
        lifetimes: TokenLifetimes,
        links: LinkBuilder,
    ) -> Self {
        Self {
            tokens: VerificationTokens::new(Arc::clone(&repository), lifetimes),
            repository,
            email_sender,
            authenticator,
            links,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        run_blocking(move || authenticator.hash_password(&password)).await?
            .map_err(UserError::from)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        let hash = hash.to_string();
        run_blocking(move || authenticator.verify_password(&password, &hash)).await?
            .map_err(UserError::from)
    }

    async fn send_verification(&self, user: &User, token: &str) -> Result<(), UserError> {
        let message = EmailMessage::verification(
            &user.name,
            &self.links.verification(token),
            self.tokens.lifetime(TokenPurpose::EmailVerification),
        );

        self.email_sender
            .send(&user.email, &message.subject, &message.body)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send verification email");
                UserError::DeliveryFailed(e)
            })
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), UserError> {
        let message = EmailMessage::password_reset(
            &user.name,
            &self.links.password_reset(token),
            self.tokens.lifetime(TokenPurpose::PasswordReset),
        );

        self.email_sender
            .send(&user.email, &message.subject, &message.body)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send password reset email");
                UserError::DeliveryFailed(e)
            })
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, UserError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| UserError::Unknown(format!("Blocking task failed: {}", e)))
}

#[async_trait]
impl<UR, ES> IdentityServicePort for IdentityService<UR, ES>
where
    UR: UserRepository,
    ES: EmailSender,
{
    async fn register(&self, command: RegisterCommand) -> Result<Registration, UserError> {
        let password_hash = self.hash_password(command.password.as_str()).await?;

        let now = Utc::now();
        let mut user = User::new(command.email, password_hash, command.name, command.phone, now);
        let verification = self.tokens.prepare(TokenPurpose::EmailVerification, now);
        let verification_token = verification.token.clone();
        user.email_verification = Some(verification);

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        // The account exists regardless of whether the email goes out
        let email_sent = self
            .send_verification(&created_user, &verification_token)
            .await
            .is_ok();

        let token = self.authenticator.issue_token(created_user.id)?;

        Ok(Registration {
            user: created_user,
            token,
            email_sent,
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<Session, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;

        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(run_blocking(move || authenticator.reject_unknown(&password))
                .await?
                .into());
        };

        let stored_hash = user.password_hash.clone();
        let user_id = user.id;
        let result =
            run_blocking(move || authenticator.authenticate(&password, &stored_hash, user_id))
                .await?
                .map_err(|e| {
                    tracing::debug!(user_id = %user_id, error = %e, "Login rejected");
                    UserError::from(e)
                })?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session {
            user,
            token: result.access_token,
        })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserError> {
        self.repository.update_profile(id, changes, Utc::now()).await
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let user = self.get_user(id).await?;

        if !self
            .verify_password(&command.current_password, &user.password_hash)
            .await?
        {
            return Err(UserError::InvalidCredentials);
        }

        let password_hash = self.hash_password(command.new_password.as_str()).await?;
        self.repository
            .update_password(id, password_hash, Utc::now())
            .await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn resend_verification(&self, id: &UserId) -> Result<(), UserError> {
        let user = self.get_user(id).await?;
        if user.is_verified {
            return Err(UserError::AlreadyVerified);
        }

        let (user, token) = self
            .tokens
            .issue(id, TokenPurpose::EmailVerification)
            .await?;

        self.send_verification(&user, &token).await
    }

    async fn verify_email(&self, token: &str) -> Result<User, UserError> {
        self.tokens
            .consume(token, TokenPurpose::EmailVerification, TokenEffect::MarkVerified)
            .await
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), UserError> {
        let Some(user) = self.repository.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let (user, token) = self
            .tokens
            .issue(&user.id, TokenPurpose::PasswordReset)
            .await?;

        self.send_password_reset(&user, &token).await
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), UserError> {
        if command.token.is_empty() {
            return Err(UserError::InvalidOrExpiredToken);
        }

        let password_hash = self.hash_password(command.new_password.as_str()).await?;
        let user = self
            .tokens
            .consume(
                &command.token,
                TokenPurpose::PasswordReset,
                TokenEffect::ReplacePasswordHash(password_hash),
            )
            .await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn purge_expired_tokens(&self) -> Result<u64, UserError> {
        self.repository.purge_expired_tokens(Utc::now()).await
    }
}
