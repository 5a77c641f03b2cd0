use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenSigner;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

const DECOY_PASSWORD: &str = "decoy password that is never compared for real";

/// Authentication coordinator combining password verification and session tokens.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and token signing.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_signer: TokenSigner,
    decoy_hash: String,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Session token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// Hashes a decoy password once so that logins for unknown accounts can
    /// spend the same amount of work as logins with a wrong password.
    ///
    /// # Arguments
    /// * `password_hasher` - Configured password hasher
    /// * `token_signer` - Configured session token signer
    ///
    /// # Errors
    /// * `PasswordError` - Decoy hash could not be computed
    pub fn new(
        password_hasher: PasswordHasher,
        token_signer: TokenSigner,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = password_hasher.hash(DECOY_PASSWORD)?;

        Ok(Self {
            password_hasher,
            token_signer,
            decoy_hash,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is malformed
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a session token for `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Identity the token is bound to
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Password verification failed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: impl ToString,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.token_signer.issue(subject)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Spend one verification on the decoy hash and reject.
    ///
    /// Used when the account does not exist, so the response time does not
    /// tell unknown accounts apart from wrong passwords.
    pub fn reject_unknown(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.verify(password, &self.decoy_hash);
        AuthenticationError::InvalidCredentials
    }

    /// Issue a session token without password verification.
    ///
    /// Used right after registration, where the caller just chose the password.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(&self, subject: impl ToString) -> Result<String, JwtError> {
        self.token_signer.issue(subject)
    }

    /// Validate a session token.
    ///
    /// # Errors
    /// * `JwtError` - Token is malformed, forged or expired
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_signer.validate(token)
    }
}
