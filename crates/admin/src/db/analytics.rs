//! Product analytics history.
//!
//! Each row is one period of counters for a product. Reads pair every row
//! with the row immediately before it (latest `last_updated` strictly
//! earlier, same product) so the trend can be derived without a second query.

use sqlx::PgPool;

use metra_core::AnalyticsId;

use super::RepositoryError;
use crate::models::{AnalyticsPayload, AnalyticsRow};

const ANALYTICS_SELECT: &str = "\
    SELECT a.id, a.product_id AS product, p.name AS product_name, c.name AS category, \
           a.views, a.cart_additions, a.purchases, a.last_updated, \
           prev.views AS previous_views, prev.purchases AS previous_purchases \
    FROM dashboard.product_analytics a \
    JOIN store.product p ON p.id = a.product_id \
    JOIN store.category c ON c.id = p.category_id \
    LEFT JOIN LATERAL ( \
        SELECT b.views, b.purchases FROM dashboard.product_analytics b \
        WHERE b.product_id = a.product_id AND b.last_updated < a.last_updated \
        ORDER BY b.last_updated DESC, b.id DESC \
        LIMIT 1 \
    ) prev ON TRUE";

/// Repository for analytics rows.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All rows, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AnalyticsRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(&format!(
            "{ANALYTICS_SELECT} ORDER BY a.last_updated DESC, a.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this ID.
    pub async fn get(&self, id: AnalyticsId) -> Result<AnalyticsRow, RepositoryError> {
        sqlx::query_as::<_, AnalyticsRow>(&format!("{ANALYTICS_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Start a new period for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for an unknown product.
    pub async fn create(
        &self,
        payload: &AnalyticsPayload,
    ) -> Result<AnalyticsRow, RepositoryError> {
        let id: AnalyticsId = sqlx::query_scalar(
            "INSERT INTO dashboard.product_analytics (product_id, views, cart_additions, purchases) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(payload.product)
        .bind(payload.views)
        .bind(payload.cart_additions)
        .bind(payload.purchases)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Analytics"))?;
        self.get(id).await
    }

    /// Overwrite a row's counters and stamp it as updated now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` for an unknown product.
    pub async fn update(
        &self,
        id: AnalyticsId,
        payload: &AnalyticsPayload,
    ) -> Result<AnalyticsRow, RepositoryError> {
        let result = sqlx::query(
            "UPDATE dashboard.product_analytics \
             SET product_id = $2, views = $3, cart_additions = $4, purchases = $5, \
                 last_updated = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(payload.product)
        .bind(payload.views)
        .bind(payload.cart_additions)
        .bind(payload.purchases)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Analytics"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: AnalyticsId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.product_analytics WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
