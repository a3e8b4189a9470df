//! Live search API.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::search::SearchResponse;
use crate::state::AppState;

/// Live search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `GET /api/products/search/?q=`: up to eight matching products plus
/// suggestions drawn from recent searches and category names.
#[instrument(skip(state))]
pub async fn api(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let response = state.search().search(state.pool(), &query.q).await?;
    Ok(Json(response))
}
