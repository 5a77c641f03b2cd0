use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::IssuedToken;
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
use crate::user::errors::EmailDeliveryError;
use crate::user::errors::UserError;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new account, send its verification email and open a session.
    ///
    /// # Returns
    /// Created user, session token and whether the verification email went out
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Normalized email is already registered
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Registration, UserError>;

    /// Authenticate with email and password.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<Session, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Store operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Apply a partial profile update.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Store operation failed
    async fn update_profile(&self, id: &UserId, changes: ProfileChanges)
        -> Result<User, UserError>;

    /// Replace the password after checking the current one.
    ///
    /// Existing sessions stay valid until they expire.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `InvalidCredentials` - Current password does not match
    /// * `DatabaseError` - Store operation failed
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;

    /// Issue a fresh verification token and email it.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `AlreadyVerified` - Nothing left to verify
    /// * `DeliveryFailed` - Email could not be sent
    async fn resend_verification(&self, id: &UserId) -> Result<(), UserError>;

    /// Consume an email verification token.
    ///
    /// # Returns
    /// The now verified user
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Unknown, already used or expired token
    async fn verify_email(&self, token: &str) -> Result<User, UserError>;

    /// Start a password reset.
    ///
    /// Succeeds silently for unknown emails.
    ///
    /// # Errors
    /// * `DeliveryFailed` - Account exists but the email could not be sent
    /// * `DatabaseError` - Store operation failed
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), UserError>;

    /// Consume a password reset token and replace the password.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Unknown, already used or expired token
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), UserError>;

    /// Clear token pairs whose expiry has passed.
    ///
    /// # Returns
    /// Number of token pairs cleared
    async fn purge_expired_tokens(&self) -> Result<u64, UserError>;
}

/// Persistence operations for the user aggregate.
///
/// Implementations receive already normalized emails and must enforce email
/// uniqueness themselves, atomically.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by normalized email address.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Apply profile changes and refresh `updated_at`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, UserError>;

    /// Replace the password hash and refresh `updated_at`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_password(
        &self,
        id: &UserId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<User, UserError>;

    /// Store a token for `purpose`, overwriting any previous one.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn store_token(
        &self,
        id: &UserId,
        purpose: TokenPurpose,
        issued: IssuedToken,
        now: DateTime<Utc>,
    ) -> Result<User, UserError>;

    /// Atomically find the user holding `token` for `purpose` with an expiry
    /// after `now`, apply `effect`, and clear the token pair.
    ///
    /// Of two concurrent calls with the same token at most one returns a user.
    ///
    /// # Returns
    /// Updated user, or None when no unexpired token matches
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn consume_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
        effect: TokenEffect,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError>;

    /// Clear every token pair that expired at or before `now`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, UserError>;
}

/// Outbound email capability.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Deliver a plain-text email.
    ///
    /// # Errors
    /// * `ConnectionFailed` - Provider unreachable
    /// * `Rejected` - Provider refused the message
    /// * `Timeout` - Provider did not answer in time
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailDeliveryError>;
}
