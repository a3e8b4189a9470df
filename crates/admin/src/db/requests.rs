//! Customer request repository.

use sqlx::PgPool;

use metra_core::{CustomerRequestId, UserId};

use super::RepositoryError;
use crate::models::{CustomerRequest, RequestPayload};

const REQUEST_SELECT: &str = "\
    SELECT r.id, r.user_id, u.username, u.email AS user_email, r.request_type, \
           r.subject, r.message, r.status, r.created_at, r.updated_at \
    FROM dashboard.customer_request r \
    JOIN store.user u ON u.id = r.user_id";

/// Repository for customer requests.
pub struct RequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestRepository<'a> {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CustomerRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, CustomerRequest>(&format!(
            "{REQUEST_SELECT} ORDER BY r.created_at DESC, r.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(requests)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no request has this ID.
    pub async fn get(&self, id: CustomerRequestId) -> Result<CustomerRequest, RepositoryError> {
        sqlx::query_as::<_, CustomerRequest>(&format!("{REQUEST_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for an unknown user.
    pub async fn create(
        &self,
        user_id: UserId,
        payload: &RequestPayload,
    ) -> Result<CustomerRequest, RepositoryError> {
        let id: CustomerRequestId = sqlx::query_scalar(
            "INSERT INTO dashboard.customer_request \
                 (user_id, request_type, subject, message, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(user_id)
        .bind(payload.request_type)
        .bind(&payload.subject)
        .bind(&payload.message)
        .bind(payload.status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Request"))?;
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` for an unknown user.
    pub async fn update(
        &self,
        id: CustomerRequestId,
        user_id: UserId,
        payload: &RequestPayload,
    ) -> Result<CustomerRequest, RepositoryError> {
        let result = sqlx::query(
            "UPDATE dashboard.customer_request \
             SET user_id = $2, request_type = $3, subject = $4, message = $5, status = $6, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(user_id)
        .bind(payload.request_type)
        .bind(&payload.subject)
        .bind(&payload.message)
        .bind(payload.status)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Request"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: CustomerRequestId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.customer_request WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
