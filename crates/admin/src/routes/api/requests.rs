//! Customer requests.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use metra_core::CustomerRequestId;

use super::{ApiJson, ApiPath, DELETED};
use crate::db::RequestRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{CustomerRequestView, RequestPatch, RequestPayload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/requests/", get(list).post(create))
        .route(
            "/api/dashboard/requests/{id}/",
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
) -> Result<Json<Vec<CustomerRequestView>>> {
    let requests = RequestRepository::new(state.pool()).list().await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Open a request; `user` defaults to the caller.
///
/// # Errors
///
/// 400 for a blank subject or message, or an unknown user.
#[instrument(skip(state, staff, body), fields(staff = %staff.username))]
pub async fn create(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RequestPayload>,
) -> Result<Response> {
    body.validate().map_err(AppError::BadRequest)?;
    let user = body.user.unwrap_or(staff.id);
    let request = RequestRepository::new(state.pool()).create(user, &body).await?;
    tracing::info!(id = %request.id, request_type = %request.request_type, "Request opened");
    Ok((StatusCode::CREATED, Json(CustomerRequestView::from(request))).into_response())
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerRequestId>,
) -> Result<Json<CustomerRequestView>> {
    Ok(Json(RequestRepository::new(state.pool()).get(id).await?.into()))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields. A missing `user` keeps
/// the current one.
#[instrument(skip(state, _staff, body))]
pub async fn update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerRequestId>,
    ApiJson(body): ApiJson<RequestPayload>,
) -> Result<Json<CustomerRequestView>> {
    body.validate().map_err(AppError::BadRequest)?;
    let requests = RequestRepository::new(state.pool());
    let current = requests.get(id).await?;
    let user = body.user.unwrap_or(current.user_id);
    Ok(Json(requests.update(id, user, &body).await?.into()))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields.
#[instrument(skip(state, _staff, body))]
pub async fn partial_update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerRequestId>,
    ApiJson(body): ApiJson<RequestPatch>,
) -> Result<Json<CustomerRequestView>> {
    let requests = RequestRepository::new(state.pool());
    let current = CustomerRequestView::from(requests.get(id).await?);
    let owner = current.user;
    let payload = body.apply(current);
    payload.validate().map_err(AppError::BadRequest)?;
    let user = payload.user.unwrap_or(owner);
    Ok(Json(requests.update(id, user, &payload).await?.into()))
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomerRequestId>,
) -> Result<StatusCode> {
    RequestRepository::new(state.pool()).delete(id).await?;
    Ok(DELETED)
}
