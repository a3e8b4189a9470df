//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::models::SalesReport;

/// How long a sales report is served from cache.
const SALES_TTL: Duration = Duration::from_secs(60 * 60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    sales: Cache<i64, Arc<SalesReport>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sales: Cache::builder()
                    .max_capacity(128)
                    .time_to_live(SALES_TTL)
                    .build(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Sales reports keyed by window length in days.
    #[must_use]
    pub fn sales_cache(&self) -> &Cache<i64, Arc<SalesReport>> {
        &self.inner.sales
    }
}
