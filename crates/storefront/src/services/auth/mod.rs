//! Authentication service.
//!
//! Username/password accounts for shoppers. Hashing is shared with the admin
//! API and CLI through [`metra_core::password`].

mod error;

pub use error::AuthError;

use sqlx::PgPool;

use metra_core::Email;
use metra_core::password::{hash_password, validate_new_password, verify_password};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, User};

/// Longest accepted username.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Longest accepted first or last name.
pub const MAX_NAME_LENGTH: usize = 30;

/// Signup form input.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new shopper.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of `AuthError` for bad input and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, form: &Registration<'_>) -> Result<User, AuthError> {
        let username = validate_username(form.username)?;
        let first_name = required_name(form.first_name, "first name")?;
        let last_name = required_name(form.last_name, "last name")?;
        let email = Email::parse(form.email)?;
        validate_new_password(form.password, form.password_confirmation)?;

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                first_name,
                last_name,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Err(e) = self.users.touch_last_login(user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to update last_login");
        }

        Ok(user)
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
        return Err(AuthError::InvalidUsername("150 characters or fewer"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthError::InvalidUsername(
            "letters, digits and @/./+/-/_ only",
        ));
    }
    Ok(username.to_string())
}

fn required_name(raw: &str, field: &'static str) -> Result<String, AuthError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(name.chars().take(MAX_NAME_LENGTH).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  jane.doe ").unwrap(), "jane.doe");
        assert!(matches!(
            validate_username("   "),
            Err(AuthError::MissingField("username"))
        ));
        assert!(matches!(
            validate_username("jane doe"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username(&"a".repeat(151)),
            Err(AuthError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_required_name_trims_and_caps() {
        assert_eq!(required_name(" Ada ", "first name").unwrap(), "Ada");
        assert_eq!(required_name(&"x".repeat(40), "last name").unwrap().len(), 30);
        assert!(matches!(
            required_name("", "last name"),
            Err(AuthError::MissingField("last name"))
        ));
    }

    #[test]
    fn test_password_errors_become_form_messages() {
        let err = AuthError::from(metra_core::password::PasswordError::Mismatch);
        assert_eq!(err.user_message(), "Passwords do not match.");
        let err = AuthError::from(metra_core::password::PasswordError::InvalidCredentials);
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
