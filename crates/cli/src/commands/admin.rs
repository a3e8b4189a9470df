//! Staff user management.
//!
//! # Usage
//!
//! ```bash
//! metra-cli admin create -u alice -e alice@example.com -p 'a long passphrase'
//! ```
//!
//! The password may also come from `METRA_ADMIN_PASSWORD`.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)

use secrecy::SecretString;
use thiserror::Error;

use metra_admin::db;
use metra_admin::models::UserSummary;
use metra_admin::services::auth::{AuthError, StaffAuthService};

use super::{MissingEnvVar, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a staff user with the same validation as the register-admin endpoint.
///
/// # Errors
///
/// Returns `AdminError::Auth` for invalid input or a taken username.
pub async fn create_user(
    username: &str,
    email: &str,
    password: &str,
) -> Result<UserSummary, AdminError> {
    let url = SecretString::from(database_url("ADMIN_DATABASE_URL")?);

    tracing::info!("Connecting to admin database...");
    let pool = db::create_pool(&url).await?;

    let user = StaffAuthService::new(&pool)
        .register_admin(username, email, password)
        .await?;

    tracing::info!(
        "Staff user created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );
    Ok(user)
}
