//! Random single-use tokens for out-of-band flows (email links).
//!
//! The token carries no information about the account it belongs to; the
//! store keeps the association.

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate a hex-encoded token from the operating system CSPRNG.
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_format() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_unique() {
        let tokens: HashSet<String> = (0..256).map(|_| generate()).collect();
        assert_eq!(tokens.len(), 256);
    }
}
