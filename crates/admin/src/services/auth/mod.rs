//! Staff authentication service.
//!
//! Staff log in with a username and password once to obtain an API token,
//! then send that token with every dashboard request.

mod error;

pub use error::AuthError;

use sqlx::PgPool;

use metra_core::Email;
use metra_core::password::{hash_password, validate_password, verify_password};

use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::UserSummary;

/// Longest accepted username.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Staff authentication service.
pub struct StaffAuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> StaffAuthService<'a> {
    /// Create a new staff authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    /// Exchange staff credentials for the user's API token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user or wrong
    /// password, and `AuthError::NotStaff` for a shopper account.
    pub async fn issue_token(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let (user, hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        if !user.is_staff {
            return Err(AuthError::NotStaff);
        }

        let token = self.tokens.get_or_create(user.id).await?;
        tracing::info!(user_id = %user.id, "API token issued");
        Ok(token)
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of `AuthError` for bad input and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, AuthError> {
        let username = validate_username(username)?;
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;

        self.users
            .create_staff(&username, email.as_str(), &hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Trim and check a username: 1-150 of letters, digits and `@.+-_`.
///
/// # Errors
///
/// Returns `AuthError::MissingField` or `AuthError::InvalidUsername`.
pub fn validate_username(raw: &str) -> Result<String, AuthError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AuthError::MissingField("username"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername("at most 150 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthError::InvalidUsername("only letters, digits and @/./+/-/_"));
    }
    Ok(username.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username(" ops.lead ").unwrap(), "ops.lead");
        assert!(matches!(
            validate_username(""),
            Err(AuthError::MissingField("username"))
        ));
        assert!(matches!(
            validate_username("ops lead"),
            Err(AuthError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Unable to log in with provided credentials."
        );
        assert_eq!(
            AuthError::from(metra_core::password::PasswordError::TooShort).to_string(),
            "This password is too weak: password must be at least 8 characters."
        );
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_database() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = StaffAuthService::new(&pool);

        let err = service
            .register_admin("ops", "not-an-email", "s3cure-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));

        let err = service
            .register_admin("ops", "ops@example.com", "12345678")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }
}
