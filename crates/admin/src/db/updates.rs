//! Uploaded update packages.

use sqlx::PgPool;

use metra_core::UpdateId;

use super::RepositoryError;
use crate::models::{NewUpdate, Update};

const UPDATE_SELECT: &str = "\
    SELECT d.id, d.title, d.update_type, d.description, d.file, d.version, \
           d.uploaded_by, u.username AS uploaded_by_username, d.created_at, d.is_active \
    FROM dashboard.update d \
    LEFT JOIN store.user u ON u.id = d.uploaded_by";

/// Repository for update records. File bytes live on disk.
pub struct UpdateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UpdateRepository<'a> {
    /// Create a new update repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All updates, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Update>, RepositoryError> {
        let updates = sqlx::query_as::<_, Update>(&format!(
            "{UPDATE_SELECT} ORDER BY d.created_at DESC, d.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(updates)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no update has this ID.
    pub async fn get(&self, id: UpdateId) -> Result<Update, RepositoryError> {
        sqlx::query_as::<_, Update>(&format!("{UPDATE_SELECT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, update: &NewUpdate) -> Result<Update, RepositoryError> {
        let id: UpdateId = sqlx::query_scalar(
            "INSERT INTO dashboard.update \
                 (title, update_type, description, file, version, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&update.title)
        .bind(update.update_type)
        .bind(&update.description)
        .bind(&update.file)
        .bind(&update.version)
        .bind(update.uploaded_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Update"))?;

        tracing::info!(%id, file = %update.file, "Update stored");
        self.get(id).await
    }

    /// Delete a record, returning its stored file path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: UpdateId) -> Result<String, RepositoryError> {
        sqlx::query_scalar::<_, String>("DELETE FROM dashboard.update WHERE id = $1 RETURNING file")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
