//! Sales analytics, cached per window length for an hour.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use metra_core::analytics::sales_window;

use super::ApiQuery;
use crate::db::SalesRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::SalesReport;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/sales/", get(sales))
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesParams {
    pub days: Option<String>,
}

/// Parse `days`; absent means the default window.
///
/// # Errors
///
/// Returns a user-facing message for a non-integer or out-of-range value.
pub fn parse_days(raw: Option<&str>) -> std::result::Result<i64, String> {
    let days = match raw.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => Some(
            d.parse::<i64>()
                .map_err(|_| "days must be an integer".to_string())?,
        ),
        None => None,
    };
    sales_window(days).map_err(|e| e.to_string())
}

/// `GET /api/dashboard/sales/?days=N`
///
/// # Errors
///
/// 400 for an invalid `days`.
#[instrument(skip(state, _staff))]
pub async fn sales(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SalesParams>,
) -> Result<Json<Arc<SalesReport>>> {
    let days = parse_days(params.days.as_deref()).map_err(AppError::BadRequest)?;

    let cache = state.sales_cache();
    if let Some(report) = cache.get(&days).await {
        tracing::debug!(days, "Sales report cache hit");
        return Ok(Json(report));
    }

    let report = Arc::new(SalesRepository::new(state.pool()).report(days).await?);
    cache.insert(days, Arc::clone(&report)).await;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(None), Ok(30));
        assert_eq!(parse_days(Some("")), Ok(30));
        assert_eq!(parse_days(Some("7")), Ok(7));
        assert!(parse_days(Some("0")).is_err());
        assert!(parse_days(Some("3651")).is_err());
        assert_eq!(
            parse_days(Some("week")),
            Err("days must be an integer".to_string())
        );
    }
}
