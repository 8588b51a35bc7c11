//! Password hashing (Argon2id, PHC strings with embedded salt).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Well-formed Argon2id hash, with default parameters, that no password
/// matches. Login verifies against it when the account has no stored hash so
/// both rejection paths cost one Argon2 run.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed")]
    HashingFailed,

    #[error("password does not match")]
    Mismatch,

    #[error("stored password hash is not a valid PHC string")]
    InvalidHashFormat,

    #[error("password too weak: {0}")]
    TooWeak(&'static str),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| PasswordError::HashingFailed)?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| PasswordError::HashingFailed)?
}

/// At least [`MIN_PASSWORD_LEN`] characters with one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooWeak("must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::TooWeak("must contain a digit"));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(PasswordError::TooWeak("must contain a letter"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse 1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(verify_password("correct horse 1", &hash), Ok(()));
        assert_eq!(verify_password("correct horse 2", &hash), Err(PasswordError::Mismatch));
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = hash_password("Password1").unwrap();
        let b = hash_password("Password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_reported() {
        assert_eq!(
            verify_password("whatever", "not-a-phc-string"),
            Err(PasswordError::InvalidHashFormat)
        );
    }

    #[test]
    fn dummy_hash_parses_and_never_matches() {
        assert_eq!(verify_password("", DUMMY_PASSWORD_HASH), Err(PasswordError::Mismatch));
        assert_eq!(
            verify_password("hunter2hunter2", DUMMY_PASSWORD_HASH),
            Err(PasswordError::Mismatch)
        );
    }

    #[tokio::test]
    async fn blocking_variants_agree_with_inline_ones() {
        let hash = hash_password_blocking("Password1".to_string()).await.unwrap();
        assert_eq!(verify_password("Password1", &hash), Ok(()));
        assert_eq!(
            verify_password_blocking("Password2".to_string(), hash).await,
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn strength_rules() {
        assert!(validate_password_strength("abcd1234").is_ok());
        assert!(validate_password_strength("Pass1").is_err());
        assert!(validate_password_strength("Password").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("").is_err());
    }
}
