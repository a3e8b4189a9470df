//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                      - Health check
//! GET  /health/ready                                - Readiness check (database)
//!
//! # Auth
//! POST /api/token/                                  - Exchange staff credentials for a token (rate limited)
//! POST /api/dashboard/register-admin/               - Create a staff account (open)
//!
//! # Catalog
//! GET|POST                 /api/dashboard/categories/
//! GET|PUT|PATCH|DELETE     /api/dashboard/categories/{id}/
//! GET                      /api/dashboard/categories/{id}/products/
//! GET|POST                 /api/dashboard/products/
//! GET|PUT|PATCH|DELETE     /api/dashboard/products/{id}/
//! POST                     /api/dashboard/products/{id}/update_stock/
//!
//! # Orders
//! GET                      /api/dashboard/orders/
//! GET|PATCH|DELETE         /api/dashboard/orders/{id}/
//! POST                     /api/dashboard/orders/{id}/mark_as_paid/
//!
//! # Analytics & support
//! GET|POST                 /api/dashboard/analytics/
//! GET|PUT|PATCH|DELETE     /api/dashboard/analytics/{id}/
//! GET|POST                 /api/dashboard/requests/
//! GET|PUT|PATCH|DELETE     /api/dashboard/requests/{id}/
//! GET|POST                 /api/dashboard/updates/          (multipart upload)
//! GET|DELETE               /api/dashboard/updates/{id}/
//! GET                      /api/dashboard/sales/?days=N
//! ```

pub mod api;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api::router())
        .fallback(not_found)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found() -> AppError {
    AppError::NotFound
}
