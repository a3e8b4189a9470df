//! Product analytics with derived conversion, trend and performance score.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use metra_core::AnalyticsId;

use super::{ApiJson, ApiPath, DELETED};
use crate::db::AnalyticsRepository;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::{AnalyticsPatch, AnalyticsPayload, AnalyticsView};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/analytics/", get(list).post(create))
        .route(
            "/api/dashboard/analytics/{id}/",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
}

/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip(state, _staff))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalyticsView>>> {
    let rows = AnalyticsRepository::new(state.pool()).list().await?;
    Ok(Json(rows.into_iter().map(AnalyticsView::from).collect()))
}

/// # Errors
///
/// 400 for negative counters, purchases above cart additions, or an
/// unknown product.
#[instrument(skip(state, _staff))]
pub async fn create(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyticsPayload>,
) -> Result<Response> {
    body.validate()?;
    let row = AnalyticsRepository::new(state.pool()).create(&body).await?;
    Ok((StatusCode::CREATED, Json(AnalyticsView::from(row))).into_response())
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AnalyticsId>,
) -> Result<Json<AnalyticsView>> {
    let row = AnalyticsRepository::new(state.pool()).get(id).await?;
    Ok(Json(row.into()))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid counters.
#[instrument(skip(state, _staff))]
pub async fn update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AnalyticsId>,
    ApiJson(body): ApiJson<AnalyticsPayload>,
) -> Result<Json<AnalyticsView>> {
    body.validate()?;
    let row = AnalyticsRepository::new(state.pool()).update(id, &body).await?;
    Ok(Json(row.into()))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid counters.
#[instrument(skip(state, _staff))]
pub async fn partial_update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AnalyticsId>,
    ApiJson(body): ApiJson<AnalyticsPatch>,
) -> Result<Json<AnalyticsView>> {
    let analytics = AnalyticsRepository::new(state.pool());
    let current = AnalyticsView::from(analytics.get(id).await?);
    let payload = body.apply(&current);
    payload.validate()?;
    Ok(Json(analytics.update(id, &payload).await?.into()))
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AnalyticsId>,
) -> Result<StatusCode> {
    AnalyticsRepository::new(state.pool()).delete(id).await?;
    Ok(DELETED)
}
