//! Password hashing and verification.
//!
//! The user's id is mixed into the hashed input, so identical passwords
//! of two users never share a stored value even under the legacy digest
//! format. Two stored formats are understood:
//!
//! - Argon2id PHC strings (`$argon2id$...`), produced by [`hash_password`];
//! - lowercase hex SHA-256 digests, produced by [`legacy_digest`].

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

fn salted_input(user_id: &str, password: &str) -> String {
    format!("{user_id}.{password}")
}

fn argon2id() -> Result<Argon2<'static>, AuthError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password for storage, salted with the owning user's id and a
/// random per-hash salt.
pub fn hash_password(user_id: &str, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2id()?
        .hash_password(salted_input(user_id, password).as_bytes(), &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// Legacy stored format: hex SHA-256 of `"<user_id>.<password>"`.
pub fn legacy_digest(user_id: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salted_input(user_id, password).as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `stored` is an Argon2 PHC string rather than a legacy digest.
pub fn is_argon2_hash(stored: &str) -> bool {
    stored.trim().starts_with("$argon2")
}

/// Verify a plaintext password against the stored hash of `user_id`.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch or when no hash
/// is stored, or `Err(AuthError::Crypto)` if a PHC hash is malformed.
pub fn verify_password(user_id: &str, password: &str, stored: &str) -> Result<bool, AuthError> {
    let stored = stored.trim();
    if stored.is_empty() {
        return Ok(false);
    }

    if !stored.starts_with('$') {
        let computed = legacy_digest(user_id, password);
        return Ok(constant_time_eq(
            computed.as_bytes(),
            stored.to_ascii_lowercase().as_bytes(),
        ));
    }

    let parsed_hash = argon2::PasswordHash::new(stored)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    // Parameters come from the PHC string, not from `argon2id()`.
    match Argon2::default().verify_password(salted_input(user_id, password).as_bytes(), &parsed_hash)
    {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
