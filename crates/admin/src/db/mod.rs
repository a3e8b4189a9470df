//! Database operations for the admin API.
//!
//! The admin API reads and writes the storefront's `store` schema (catalog,
//! orders, users) and owns the `dashboard` schema (analytics history,
//! customer requests, uploaded updates, API tokens).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p metra-cli -- migrate admin
//! ```

pub mod analytics;
pub mod catalog;
pub mod orders;
pub mod requests;
pub mod sales;
pub mod tokens;
pub mod updates;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use catalog::{CategoryRepository, ProductRepository};
pub use orders::OrderRepository;
pub use requests::RequestRepository;
pub use sales::SalesRepository;
pub use tokens::TokenRepository;
pub use updates::UpdateRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (duplicate slug, unknown category, bad price).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map constraint violations on a write to `Conflict`, anything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(format!("{what} refers to a record that does not exist"));
            }
            if db_err.is_check_violation() {
                return Self::Conflict(format!("{what} has invalid values"));
            }
        }
        Self::Database(err)
    }

    /// Map a foreign-key violation on delete to `Conflict`.
    pub(crate) fn from_delete(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(format!("{what} is referenced by existing orders"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// List Query Helpers
// =============================================================================

/// `ILIKE` patterns for a `search` parameter.
///
/// Terms are split on whitespace and commas; a row matches when every term
/// matches at least one searched column.
#[must_use]
pub fn search_patterns(search: Option<&str>) -> Vec<String> {
    search
        .unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(metra_core::search::like_pattern)
        .collect()
}

/// SQL for "every pattern matches one of `columns`".
///
/// `param` is the placeholder bound to the pattern array, e.g. `$1`.
#[must_use]
pub fn search_clause(param: &str, columns: &[&str]) -> String {
    let any_column = columns
        .iter()
        .map(|col| format!("{col} ILIKE t.pat"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("NOT EXISTS (SELECT 1 FROM unnest({param}::text[]) AS t(pat) WHERE NOT ({any_column}))")
}

/// Resolve an `ordering` parameter against a whitelist.
///
/// `allowed` maps public field names to SQL expressions. A leading `-`
/// sorts descending. Unknown fields fall back to `default`.
#[must_use]
pub fn order_by(ordering: Option<&str>, allowed: &[(&str, &str)], default: &str) -> String {
    let Some(raw) = ordering.map(str::trim).filter(|o| !o.is_empty()) else {
        return default.to_string();
    };
    let (field, direction) = raw
        .strip_prefix('-')
        .map_or((raw, "ASC"), |field| (field, "DESC"));

    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map_or_else(|| default.to_string(), |(_, sql)| format!("{sql} {direction}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_patterns_split_terms() {
        assert_eq!(
            search_patterns(Some("wool, red  socks")),
            vec!["%wool%", "%red%", "%socks%"]
        );
        assert!(search_patterns(None).is_empty());
        assert_eq!(search_patterns(Some("100%")), vec![r"%100\%%"]);
    }

    #[test]
    fn test_search_clause_lists_columns() {
        assert_eq!(
            search_clause("$1", &["c.name", "c.description"]),
            "NOT EXISTS (SELECT 1 FROM unnest($1::text[]) AS t(pat) \
             WHERE NOT (c.name ILIKE t.pat OR c.description ILIKE t.pat))"
        );
    }

    #[test]
    fn test_order_by_whitelist() {
        let allowed = [("name", "c.name"), ("id", "c.id")];
        assert_eq!(order_by(Some("-name"), &allowed, "c.name ASC"), "c.name DESC");
        assert_eq!(order_by(Some("id"), &allowed, "c.name ASC"), "c.id ASC");
        assert_eq!(order_by(Some("password"), &allowed, "c.name ASC"), "c.name ASC");
        assert_eq!(order_by(None, &allowed, "c.name ASC"), "c.name ASC");
    }
}
