//! Staff authentication error types.

use thiserror::Error;

use metra_core::password::PasswordError;

use crate::db::RepositoryError;

/// Errors that can occur during staff authentication and registration.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("Enter a valid email address.")]
    InvalidEmail(#[from] metra_core::EmailError),

    /// Username is blank, too long, or has disallowed characters.
    #[error("Username may contain {0}.")]
    InvalidUsername(&'static str),

    /// A required field was left blank.
    #[error("This field is required: {0}.")]
    MissingField(&'static str),

    /// Wrong username or password.
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    /// Correct credentials, but the account is not staff.
    #[error("You do not have permission to perform this action.")]
    NotStaff,

    /// Username already taken.
    #[error("A user with that username already exists.")]
    UserAlreadyExists,

    /// Password too weak.
    #[error("This password is too weak: {0}.")]
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
