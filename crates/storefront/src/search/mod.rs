//! Live product search with a result cache and a popular-search log.
//!
//! Results for a normalized query are cached for 15 minutes. Every cache miss
//! appends the query to a rolling log of recent distinct searches, kept for
//! 24 hours after its last write, which feeds the suggestion list.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use metra_core::search::{
    MAX_RESULTS, SearchLog, description_preview, is_searchable, normalize, suggestions, tokenize,
};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::Product;

const RESULTS_TTL: Duration = Duration::from_secs(15 * 60);
const LOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_CACHED_QUERIES: u64 = 1_000;
const LOG_KEY: &str = "popular_searches";

/// One product in a live-search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub url: String,
    pub category: String,
    pub stock: i32,
    pub description_preview: String,
}

impl From<&Product> for SearchHit {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            price: format!("{:.2}", product.price),
            image: product.image.clone(),
            url: product.url(),
            category: product.category_name.clone(),
            stock: product.stock,
            description_preview: description_preview(&product.description),
        }
    }
}

/// Body of `GET /api/products/search/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    pub results: Arc<Vec<SearchHit>>,
    pub suggestions: Vec<String>,
}

/// Search caches shared by all requests.
#[derive(Clone)]
pub struct SearchService {
    results: Cache<String, Arc<Vec<SearchHit>>>,
    log: Cache<&'static str, SearchLog>,
}

impl Default for SearchService {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Cache::builder()
                .max_capacity(MAX_CACHED_QUERIES)
                .time_to_live(RESULTS_TTL)
                .build(),
            log: Cache::builder().max_capacity(1).time_to_live(LOG_TTL).build(),
        }
    }

    /// Run a live search.
    ///
    /// Queries under two characters, or without any word characters, return
    /// an empty response without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, pool))]
    pub async fn search(
        &self,
        pool: &PgPool,
        query: &str,
    ) -> Result<SearchResponse, RepositoryError> {
        let query = query.trim();
        let key = normalize(query);
        if !is_searchable(query) || key.is_empty() {
            return Ok(SearchResponse::default());
        }

        let catalog = CatalogRepository::new(pool);

        let results = if let Some(hit) = self.results.get(&key).await {
            tracing::debug!(%key, "Search cache hit");
            hit
        } else {
            let limit = i64::try_from(MAX_RESULTS).unwrap_or(i64::MAX);
            let products = catalog.search(&tokenize(query), limit).await?;
            let hits = Arc::new(products.iter().map(SearchHit::from).collect::<Vec<_>>());
            self.results.insert(key, Arc::clone(&hits)).await;
            self.remember(query).await;
            hits
        };

        let log = self.popular_searches().await;
        let categories = catalog.category_names().await?;

        Ok(SearchResponse {
            results,
            suggestions: suggestions(query, &log, &categories),
        })
    }

    /// The current popular-search log.
    pub async fn popular_searches(&self) -> SearchLog {
        self.log.get(LOG_KEY).await.unwrap_or_default()
    }

    /// Append a query to the log, restarting its 24 hour lifetime.
    pub async fn remember(&self, query: &str) {
        let mut log = self.popular_searches().await;
        if log.record(query) {
            self.log.insert(LOG_KEY, log).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_keeps_distinct_lowercased_queries() {
        let search = SearchService::new();
        search.remember("Wool Socks").await;
        search.remember("wool socks").await;
        search.remember("teapot").await;

        let log = search.popular_searches().await;
        assert_eq!(log.entries(), ["wool socks", "teapot"]);
    }

    #[tokio::test]
    async fn test_short_query_skips_database() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let search = SearchService::new();

        let response = search.search(&pool, " a ").await.unwrap();
        assert!(response.results.is_empty());
        assert!(response.suggestions.is_empty());

        let response = search.search(&pool, "?!").await.unwrap();
        assert!(response.results.is_empty());
    }
}
