//! Product management and stock updates.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use metra_core::{CategoryId, ProductId};

use super::{ApiJson, ApiPath, ApiQuery, DELETED};
use crate::db::ProductRepository;
use crate::db::catalog::ListQuery;
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{Product, ProductPatch, ProductPayload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/products/", get(list).post(create))
        .route(
            "/api/dashboard/products/{id}/",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
        .route(
            "/api/dashboard/products/{id}/update_stock/",
            post(update_stock),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
    /// Category ID; a blank or non-numeric value is ignored.
    pub category: Option<String>,
}

/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip(state, _staff))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Vec<Product>>> {
    let category = params
        .category
        .as_deref()
        .and_then(|c| c.parse::<CategoryId>().ok());
    let query = ListQuery {
        search: params.search.as_deref(),
        ordering: params.ordering.as_deref(),
    };
    Ok(Json(
        ProductRepository::new(state.pool())
            .list(category, &query)
            .await?,
    ))
}

/// # Errors
///
/// 400 for invalid fields, a duplicate slug or an unknown category.
#[instrument(skip(state, _staff, body))]
pub async fn create(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductPayload>,
) -> Result<Response> {
    let payload = body.normalize().map_err(AppError::BadRequest)?;
    let product = ProductRepository::new(state.pool()).create(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(ProductRepository::new(state.pool()).get(id).await?))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields.
#[instrument(skip(state, _staff, body))]
pub async fn update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ProductPayload>,
) -> Result<Json<Product>> {
    let payload = body.normalize().map_err(AppError::BadRequest)?;
    Ok(Json(
        ProductRepository::new(state.pool()).update(id, &payload).await?,
    ))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields.
#[instrument(skip(state, _staff, body))]
pub async fn partial_update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let products = ProductRepository::new(state.pool());
    let current = products.get(id).await?;
    let payload = body.apply(current).normalize().map_err(AppError::BadRequest)?;
    Ok(Json(products.update(id, &payload).await?))
}

/// # Errors
///
/// 404 for an unknown ID, 400 if the product has been ordered.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(%id, "Product deleted");
    Ok(DELETED)
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    #[serde(default)]
    pub stock: Value,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Read `stock` from a JSON number or numeric string. Absent means zero.
///
/// # Errors
///
/// "Invalid stock value" for anything that is not an integer, and
/// "Stock cannot be negative" below zero.
pub fn parse_stock(value: &Value) -> std::result::Result<i32, &'static str> {
    const INVALID: &str = "Invalid stock value";
    let stock = match value {
        Value::Null => 0,
        Value::Number(n) => n.as_i64().ok_or(INVALID)?,
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| INVALID)?,
        _ => return Err(INVALID),
    };
    if stock < 0 {
        return Err("Stock cannot be negative");
    }
    i32::try_from(stock).map_err(|_| INVALID)
}

/// `POST /api/dashboard/products/{id}/update_stock/`
///
/// # Errors
///
/// 400 for a negative or non-integer stock, 404 for an unknown ID.
#[instrument(skip(state, _staff, body))]
pub async fn update_stock(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<Json<StatusResponse>> {
    let stock = parse_stock(&body.stock).map_err(|e| AppError::BadRequest(e.to_string()))?;
    ProductRepository::new(state.pool())
        .set_stock(id, stock)
        .await?;
    Ok(Json(StatusResponse {
        status: "stock updated",
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_stock() {
        assert_eq!(parse_stock(&json!(12)), Ok(12));
        assert_eq!(parse_stock(&json!(" 7 ")), Ok(7));
        assert_eq!(parse_stock(&Value::Null), Ok(0));
        assert_eq!(parse_stock(&json!(-1)), Err("Stock cannot be negative"));
        assert_eq!(parse_stock(&json!("-3")), Err("Stock cannot be negative"));
        assert_eq!(parse_stock(&json!("lots")), Err("Invalid stock value"));
        assert_eq!(parse_stock(&json!(2.5)), Err("Invalid stock value"));
        assert_eq!(parse_stock(&json!([1])), Err("Invalid stock value"));
    }
}
