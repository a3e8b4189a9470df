//! Argon2id password hashing.
//!
//! Shoppers (storefront) and staff (admin API, CLI) share one user table, so
//! both binaries hash and verify through these functions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hashing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    #[error("password cannot be entirely numeric")]
    AllDigits,
    #[error("passwords do not match")]
    Mismatch,
    #[error("password hashing failed")]
    Hash,
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Check a new password against the strength rules.
///
/// # Errors
///
/// Returns [`PasswordError::TooShort`] or [`PasswordError::AllDigits`].
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(PasswordError::AllDigits);
    }
    Ok(())
}

/// Validate a password and its confirmation from a signup form.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] before any strength error.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    validate_password(password)
}

/// Hash a password into a PHC string.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if Argon2 fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored PHC string.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidCredentials`] on mismatch or a corrupt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("battery staple", &hash),
            Err(PasswordError::InvalidCredentials)
        );
    }

    #[test]
    fn test_corrupt_hash_is_invalid_credentials() {
        assert_eq!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::InvalidCredentials)
        );
    }

    #[test]
    fn test_strength_rules() {
        assert_eq!(validate_password("short"), Err(PasswordError::TooShort));
        assert_eq!(validate_password("12345678"), Err(PasswordError::AllDigits));
        assert!(validate_password("long enough").is_ok());
        assert_eq!(
            validate_new_password("long enough", "long enougH"),
            Err(PasswordError::Mismatch)
        );
    }
}
