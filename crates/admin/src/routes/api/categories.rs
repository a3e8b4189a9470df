//! Category management.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use metra_core::CategoryId;

use super::{ApiJson, ApiPath, ApiQuery, DELETED, ListParams};
use crate::db::catalog::ListQuery;
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{Category, CategoryPatch, CategoryPayload, Product};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/categories/", get(list).post(create))
        .route(
            "/api/dashboard/categories/{id}/",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
        .route("/api/dashboard/categories/{id}/products/", get(products))
}

/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip(state, _staff))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Category>>> {
    let query = ListQuery {
        search: params.search.as_deref(),
        ordering: params.ordering.as_deref(),
    };
    Ok(Json(CategoryRepository::new(state.pool()).list(&query).await?))
}

/// # Errors
///
/// 400 for a blank name or duplicate slug.
#[instrument(skip(state, _staff, body))]
pub async fn create(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryPayload>,
) -> Result<Response> {
    let payload = body.normalize().map_err(AppError::BadRequest)?;
    let category = CategoryRepository::new(state.pool()).create(&payload).await?;
    tracing::info!(id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    Ok(Json(CategoryRepository::new(state.pool()).get(id).await?))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields.
#[instrument(skip(state, _staff, body))]
pub async fn update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<CategoryPayload>,
) -> Result<Json<Category>> {
    let payload = body.normalize().map_err(AppError::BadRequest)?;
    Ok(Json(
        CategoryRepository::new(state.pool()).update(id, &payload).await?,
    ))
}

/// # Errors
///
/// 404 for an unknown ID, 400 for invalid fields.
#[instrument(skip(state, _staff, body))]
pub async fn partial_update(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<CategoryPatch>,
) -> Result<Json<Category>> {
    let categories = CategoryRepository::new(state.pool());
    let current = categories.get(id).await?;
    let payload = body.apply(current).normalize().map_err(AppError::BadRequest)?;
    Ok(Json(categories.update(id, &payload).await?))
}

/// # Errors
///
/// 404 for an unknown ID, 400 if its products have been ordered.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(%id, "Category deleted");
    Ok(DELETED)
}

/// Products in one category.
///
/// # Errors
///
/// 404 for an unknown category.
#[instrument(skip(state, _staff))]
pub async fn products(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Vec<Product>>> {
    CategoryRepository::new(state.pool()).get(id).await?;
    let products = ProductRepository::new(state.pool())
        .list(Some(id), &ListQuery::default())
        .await?;
    Ok(Json(products))
}
