//! Token issuance and admin registration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::middleware::token_rate_limiter;
use crate::models::UserSummary;
use crate::services::{AuthError, StaffAuthService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/token/", post(obtain_token).layer(token_rate_limiter()))
        .route("/api/dashboard/register-admin/", post(register_admin))
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
            AuthError::NotStaff => Self::Forbidden,
            other => Self::BadRequest(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/token/`
///
/// # Errors
///
/// 400 for wrong credentials, 403 for non-staff accounts.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Must include \"username\" and \"password\".".to_string(),
        ));
    }
    let token = StaffAuthService::new(state.pool())
        .issue_token(&body.username, &body.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

/// `POST /api/dashboard/register-admin/`. Open endpoint.
///
/// # Errors
///
/// 400 with the first validation failure.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_admin(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let user = StaffAuthService::new(state.pool())
        .register_admin(&body.username, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Admin user created successfully",
            user,
        }),
    )
        .into_response())
}
