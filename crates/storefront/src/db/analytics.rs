//! Product analytics counters written by the storefront.
//!
//! Counters live in `dashboard.product_analytics`. Each product may have a
//! history of rows; the newest by `last_updated` is the current one and is
//! the row bumped here. A product without any row gets one.

use sqlx::{PgExecutor, PgPool};

use metra_core::ProductId;

use super::RepositoryError;

const BUMP_SQL: &str = "\
    WITH current AS ( \
        SELECT id FROM dashboard.product_analytics \
        WHERE product_id = $1 \
        ORDER BY last_updated DESC, id DESC \
        LIMIT 1 \
        FOR UPDATE \
    ), bumped AS ( \
        UPDATE dashboard.product_analytics a \
        SET views = a.views + $2, \
            cart_additions = a.cart_additions + $3, \
            purchases = a.purchases + $4, \
            last_updated = NOW() \
        FROM current \
        WHERE a.id = current.id \
        RETURNING a.id \
    ) \
    INSERT INTO dashboard.product_analytics (product_id, views, cart_additions, purchases) \
    SELECT $1, $2, $3, $4 \
    WHERE NOT EXISTS (SELECT 1 FROM bumped)";

/// Which counter an event increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    View,
    CartAddition,
    Purchase,
}

impl Counter {
    /// `(views, cart_additions, purchases)` deltas for one event.
    const fn deltas(self) -> (i64, i64, i64) {
        match self {
            Self::View => (1, 0, 0),
            Self::CartAddition => (0, 1, 0),
            Self::Purchase => (0, 0, 1),
        }
    }
}

/// Increment one counter of a product's current analytics row.
///
/// Takes any executor so checkout can bump purchases inside its transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn bump<'e, E>(
    executor: E,
    product_id: ProductId,
    counter: Counter,
) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let (views, cart_additions, purchases) = counter.deltas();
    sqlx::query(BUMP_SQL)
        .bind(product_id)
        .bind(views)
        .bind(cart_additions)
        .bind(purchases)
        .execute(executor)
        .await?;
    Ok(())
}

/// Repository for storefront-side analytics events.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an event. Failures are logged, not returned.
    pub async fn record(&self, product_id: ProductId, counter: Counter) {
        if let Err(e) = bump(self.pool, product_id, counter).await {
            tracing::warn!(%product_id, ?counter, error = %e, "Failed to record product analytics");
        }
    }
}
