//! Staff accounts in `store.user`.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{StaffUser, UserSummary};

/// Repository for the users the admin API authenticates.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user and their password hash by username (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(StaffUser, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: StaffUser,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT id, username, is_staff, password_hash FROM store.user \
             WHERE lower(username) = lower($1)",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub async fn create_staff(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserSummary, RepositoryError> {
        let user = sqlx::query_as::<_, UserSummary>(
            "INSERT INTO store.user (username, email, password_hash, is_staff) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING id, username, email",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "A user with that username"))?;

        tracing::info!(user_id = %user.id, username = %user.username, "Staff user created");
        Ok(user)
    }
}
