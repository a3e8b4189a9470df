//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! metra-cli migrate storefront
//! metra-cli migrate admin
//! metra-cli migrate all
//! ```
//!
//! The admin schema references the store schema, so `all` runs storefront
//! migrations first. Both sets may share one database; each migrator
//! ignores the other's applied versions.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

use super::{MissingEnvVar, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    run(
        "storefront",
        "STOREFRONT_DATABASE_URL",
        sqlx::migrate!("../storefront/migrations"),
    )
    .await
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    run("admin", "ADMIN_DATABASE_URL", sqlx::migrate!("../admin/migrations")).await
}

async fn run(
    name: &str,
    env_var: &'static str,
    mut migrator: Migrator,
) -> Result<(), MigrationError> {
    let url = database_url(env_var)?;

    tracing::info!("Connecting to {name} database...");
    let pool = PgPool::connect(&url).await?;

    migrator.set_ignore_missing(true);

    tracing::info!(count = migrator.iter().count(), "Running {name} migrations...");
    migrator.run(&pool).await?;

    tracing::info!("{name} migrations complete!");
    Ok(())
}
