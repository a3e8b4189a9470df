//! JSON API handlers.
//!
//! Every `/api/dashboard/*` handler except `register-admin` takes
//! [`RequireStaff`](crate::middleware::RequireStaff). Request bodies, paths
//! and queries go through the `Api*` extractors so malformed input is
//! answered with the same `{"error": "..."}` shape as every other failure.

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod requests;
pub mod sales;
pub mod updates;

use axum::{Router, extract::FromRequest, extract::FromRequestParts, http::StatusCode};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(analytics::router())
        .merge(requests::router())
        .merge(updates::router())
        .merge(sales::router())
}

/// `axum::Json` with JSON error bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path`; unparseable IDs are 404s.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with JSON error bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `search` and `ordering` parameters of list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Empty `204 No Content` for deletes.
pub const DELETED: StatusCode = StatusCode::NO_CONTENT;
