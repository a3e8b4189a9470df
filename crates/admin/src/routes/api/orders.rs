//! Order review, status changes and payment marking.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use metra_core::OrderId;

use super::products::StatusResponse;
use super::{ApiJson, ApiPath, ApiQuery, DELETED};
use crate::db::OrderRepository;
use crate::db::orders::PaidFilter;
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{OrderItem, OrderPatch, OrderRow, OrderView};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/orders/", get(list))
        .route(
            "/api/dashboard/orders/{id}/",
            get(retrieve).patch(partial_update).delete(destroy),
        )
        .route("/api/dashboard/orders/{id}/mark_as_paid/", post(mark_as_paid))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    /// `paid` or `unpaid`.
    pub status: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Attach each order's lines.
async fn with_items(orders: &OrderRepository<'_>, rows: Vec<OrderRow>) -> Result<Vec<OrderView>> {
    let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
    let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for (order_id, item) in orders.items(&ids).await? {
        items.entry(order_id).or_default().push(item);
    }

    let now = Utc::now();
    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            OrderView::new(row, lines, now)
        })
        .collect())
}

async fn view(orders: &OrderRepository<'_>, id: OrderId) -> Result<OrderView> {
    let row = orders.get(id).await?;
    with_items(orders, vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)
}

/// # Errors
///
/// Returns an error if a query fails.
#[instrument(skip(state, _staff))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool());
    let rows = orders
        .list(
            PaidFilter::parse(params.status.as_deref()),
            params.search.as_deref(),
            params.ordering.as_deref(),
        )
        .await?;
    Ok(Json(with_items(&orders, rows).await?))
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    let orders = OrderRepository::new(state.pool());
    Ok(Json(view(&orders, id).await?))
}

/// Change `status` and/or `paid`.
///
/// # Errors
///
/// 404 for an unknown ID, 400 for an unknown status.
#[instrument(skip(state, _staff))]
pub async fn partial_update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<OrderPatch>,
) -> Result<Json<OrderView>> {
    let orders = OrderRepository::new(state.pool());
    orders.update(id, body.status, body.paid).await?;
    Ok(Json(view(&orders, id).await?))
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;
    tracing::info!(%id, "Order deleted");
    Ok(DELETED)
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn mark_as_paid(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<StatusResponse>> {
    OrderRepository::new(state.pool()).mark_as_paid(id).await?;
    Ok(Json(StatusResponse {
        status: "order marked as paid",
    }))
}
