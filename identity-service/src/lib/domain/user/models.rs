use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use uuid::Uuid;

use crate::user::errors::AvatarError;
use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::PhoneError;
use crate::user::errors::UserIdError;

/// Avatar assigned to accounts that never set one.
pub const DEFAULT_AVATAR: &str = "https://i.pravatar.cc/100?img=15";

/// User aggregate entity.
///
/// Represents a registered account and the state of its two single-use
/// token flows.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub name: DisplayName,
    pub avatar: AvatarUrl,
    pub phone: Option<PhoneNumber>,
    pub is_verified: bool,
    pub email_verification: Option<IssuedToken>,
    pub password_reset: Option<IssuedToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh, unverified account.
    ///
    /// # Arguments
    /// * `email` - Normalized email address
    /// * `password_hash` - Output of the password hasher, never plaintext
    /// * `name` - Display name
    /// * `phone` - Optional phone number
    /// * `now` - Creation instant
    pub fn new(
        email: EmailAddress,
        password_hash: String,
        name: DisplayName,
        phone: Option<PhoneNumber>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            name,
            avatar: AvatarUrl::default(),
            phone,
            is_verified: false,
            email_verification: None,
            password_reset: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored token slot for the given purpose.
    pub fn token(&self, purpose: TokenPurpose) -> Option<&IssuedToken> {
        match purpose {
            TokenPurpose::EmailVerification => self.email_verification.as_ref(),
            TokenPurpose::PasswordReset => self.password_reset.as_ref(),
        }
    }

    /// Mutable token slot for the given purpose.
    pub fn token_slot(&mut self, purpose: TokenPurpose) -> &mut Option<IssuedToken> {
        match purpose {
            TokenPurpose::EmailVerification => &mut self.email_verification,
            TokenPurpose::PasswordReset => &mut self.password_reset,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser, then trimmed and lowercased so that
/// every lookup and uniqueness check works on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, normalized email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted by the password policy.
///
/// Only lives for the duration of a request; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 6;

    /// # Errors
    /// * `TooShort` - Fewer than 6 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Display name, 1 to 50 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 50;

    /// # Errors
    /// * `Empty` - Name is blank
    /// * `TooLong` - Name exceeds 50 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();
        if length == 0 {
            Err(NameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number: optional leading `+`, then digits with spaces or dashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 7;
    const MAX_DIGITS: usize = 20;

    /// # Errors
    /// * `InvalidFormat` - Contains other characters or has a wrong digit count
    pub fn new(phone: String) -> Result<Self, PhoneError> {
        let phone = phone.trim().to_string();
        let body = phone.strip_prefix('+').unwrap_or(&phone);

        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidFormat);
        }

        let digits = body.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(phone))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Absolute http(s) URL of a profile picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUrl(String);

impl AvatarUrl {
    /// # Errors
    /// * `InvalidUrl` - Not an absolute http or https URL
    pub fn new(avatar: String) -> Result<Self, AvatarError> {
        let parsed = url::Url::parse(avatar.trim()).map_err(|_| AvatarError::InvalidUrl)?;
        match parsed.scheme() {
            "http" | "https" if parsed.has_host() => Ok(Self(parsed.to_string())),
            _ => Err(AvatarError::InvalidUrl),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AvatarUrl {
    fn default() -> Self {
        Self(DEFAULT_AVATAR.to_string())
    }
}

/// The two single-use token flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::EmailVerification => f.write_str("email_verification"),
            TokenPurpose::PasswordReset => f.write_str("password_reset"),
        }
    }
}

/// A stored single-use token together with its expiry.
///
/// Keeping both in one value means one can never be set without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn new(token: String, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            token,
            expires_at: issued_at + lifetime,
        }
    }

    /// Whether `token` matches and is still valid at `now`.
    ///
    /// The comparison time does not depend on where the values differ.
    pub fn accepts(&self, token: &str, now: DateTime<Utc>) -> bool {
        constant_time_eq(self.token.as_bytes(), token.as_bytes()) && self.expires_at > now
    }
}

/// State change applied when a token is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEffect {
    /// Flip `is_verified` to true
    MarkVerified,
    /// Replace the password hash with an already computed one
    ReplacePasswordHash(String),
}

impl TokenEffect {
    pub fn apply(self, user: &mut User) {
        match self {
            TokenEffect::MarkVerified => user.is_verified = true,
            TokenEffect::ReplacePasswordHash(hash) => user.password_hash = hash,
        }
    }
}

/// Command to register a new account
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: Password,
    pub name: DisplayName,
    pub phone: Option<PhoneNumber>,
}

/// Command to authenticate with email and password
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

/// Partial profile update; `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<DisplayName>,
    pub phone: Option<PhoneNumber>,
    pub avatar: Option<AvatarUrl>,
}

impl ProfileChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
    }
}

/// Command to replace a known password
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: Password,
}

/// Command to replace a forgotten password using a reset token
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: Password,
}

/// Outcome of a registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub token: String,
    pub email_sent: bool,
}

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}
