/// Password hashing and verification
///
/// Uses Argon2id with per-password random salts. Plaintext passwords never
/// touch the database; only the encoded hash string is stored.
///
/// # Example
///
/// ```
/// use leadflow_shared::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("S3cureP@ss").unwrap();
/// assert!(verify_password("S3cureP@ss", &hash).unwrap());
/// assert!(!verify_password("wrong", &hash).unwrap());
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Password operation errors
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed
    #[error("Failed to hash password: {0}")]
    HashFailed(String),

    /// Stored hash could not be parsed
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

/// Hashes a plaintext password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored hash
///
/// Returns `Ok(false)` on mismatch; errors only when the stored hash itself
/// is malformed (e.g. the anonymous user's unusable `"!"` sentinel).
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
