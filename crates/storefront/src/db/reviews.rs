//! Review repository.

use sqlx::PgPool;

use metra_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Whether [`ReviewRepository::upsert`] created or replaced a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewWrite {
    Created,
    Updated,
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.comment, r.created_at \
             FROM store.review r \
             JOIN store.user u ON u.id = r.user_id \
             WHERE r.product_id = $1 \
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Create or replace a user's review and recompute the product's
    /// average rating in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn upsert(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: &str,
    ) -> Result<ReviewWrite, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // xmax is zero only for freshly inserted rows
        let inserted: bool = sqlx::query_scalar(
            "INSERT INTO store.review (product_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (product_id, user_id) \
             DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = NOW() \
             RETURNING (xmax = 0)",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE store.product \
             SET average_rating = COALESCE( \
                 (SELECT ROUND(AVG(rating)::numeric, 2) FROM store.review WHERE product_id = $1), 0), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(if inserted {
            ReviewWrite::Created
        } else {
            ReviewWrite::Updated
        })
    }
}
