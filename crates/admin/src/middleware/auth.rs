//! Token authentication for `/api/dashboard/*`.
//!
//! Clients send `Authorization: Bearer <key>`; the older `Token <key>`
//! scheme is accepted as well. Only staff users pass.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::db::TokenRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::StaffUser;
use crate::state::AppState;

const SCHEMES: [&str; 2] = ["Bearer ", "Token "];

/// The token key from an `Authorization` header, if one is present and
/// uses a known scheme.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Extractor that requires a valid token belonging to a staff user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireStaff(user): RequireStaff) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireStaff(pub StaffUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_token(&parts.headers).ok_or(AppError::Unauthorized(
            "Authentication credentials were not provided.",
        ))?;

        let user = TokenRepository::new(state.pool())
            .authenticate(key)
            .await?
            .ok_or(AppError::Unauthorized("Invalid token."))?;

        if !user.is_staff {
            tracing::warn!(user_id = %user.id, "Non-staff token rejected");
            return Err(AppError::Forbidden);
        }

        set_sentry_user(&user.id, &user.username);
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_and_token_schemes() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Token abc123")), Some("abc123"));
    }

    #[test]
    fn test_rejects_other_schemes_and_blank_keys() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
