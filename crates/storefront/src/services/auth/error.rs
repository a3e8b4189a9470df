//! Authentication error types.

use thiserror::Error;

use metra_core::password::PasswordError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] metra_core::EmailError),

    /// Username is blank, too long, or has disallowed characters.
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),

    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or confirmation mismatch.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::InvalidCredentials => Self::InvalidCredentials,
            PasswordError::Hash => Self::PasswordHash,
            PasswordError::TooShort | PasswordError::AllDigits | PasswordError::Mismatch => {
                Self::WeakPassword(err.to_string())
            }
        }
    }
}

impl AuthError {
    /// Message safe to show on the signup or login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Enter a valid email address.".to_string(),
            Self::InvalidUsername(reason) => format!("Invalid username: {reason}."),
            Self::MissingField(field) => format!("Please fill in your {field}."),
            Self::InvalidCredentials => {
                "Please enter a correct username and password.".to_string()
            }
            Self::UserAlreadyExists => "A user with that username already exists.".to_string(),
            Self::WeakPassword(reason) => {
                let mut chars = reason.chars();
                chars.next().map_or_else(String::new, |first| {
                    format!("{}{}.", first.to_uppercase(), chars.as_str())
                })
            }
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
