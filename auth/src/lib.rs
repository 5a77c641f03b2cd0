//! Authentication utilities library
//!
//! Provides the credential primitives the identity service is built on:
//! - Password hashing (Argon2id, configurable cost)
//! - Session token signing and validation (HS256 JWT)
//! - Random single-use tokens for email verification and password reset
//! - Authentication coordination
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenSigner;
//! use chrono::Duration;
//!
//! let signer = TokenSigner::new(b"secret_key_at_least_32_bytes_long!", Duration::days(7));
//! let token = signer.issue("user123").unwrap();
//! let claims = signer.validate(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, TokenSigner};
//! use chrono::Duration;
//!
//! let signer = TokenSigner::new(b"secret_key_at_least_32_bytes_long!", Duration::days(7));
//! let auth = Authenticator::new(PasswordHasher::new(), signer).unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! let result = auth.authenticate("password123", &hash, "user123").unwrap();
//!
//! // Validate token
//! let claims = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod onetime;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::TokenSigner;
pub use password::HashingParams;
pub use password::PasswordError;
pub use password::PasswordHasher;
