//! Credential hashing.
//!
//! Passwords never leave the client in clear text.  The directory hands out a
//! per-account salt (see the probe reply) and the client derives a key from it:
//!
//! ```text
//! passhash = hex( PBKDF2-HMAC-SHA256(password, salt, 100_000 rounds, 32 bytes) )
//! ```
//!
//! The salt is used as its UTF-8 bytes, exactly as received.  The digest is
//! lowercase hex, 64 characters long.

use hmac::Hmac;
use sha2::Sha256;
use thiserror::Error;

/// PBKDF2 iteration count expected by directory services.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// Errors raised while deriving a password hash.
#[derive(Debug, Error, PartialEq)]
pub enum CredentialError {
    /// The directory did not supply a salt for this account.
    #[error("missing salt")]
    EmptySalt,
    /// The key derivation function rejected its inputs.
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Derives the hex-encoded password hash sent to `/api/auth`.
///
/// # Errors
///
/// Returns [`CredentialError::EmptySalt`] when `salt` is empty and
/// [`CredentialError::Derivation`] if PBKDF2 fails.  Callers abort the
/// current join on either.
///
/// # Examples
///
/// ```rust
/// use community_core::credentials::hash_password;
///
/// let digest = hash_password("hunter2", "abc").unwrap();
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, hash_password("hunter2", "abc").unwrap());
/// ```
pub fn hash_password(password: &str, salt: &str) -> Result<String, CredentialError> {
    if salt.is_empty() {
        return Err(CredentialError::EmptySalt);
    }
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut key)
        .map_err(|e| CredentialError::Derivation(e.to_string()))?;
    Ok(hex::encode(key))
}
