//! Authentication extractors and session helpers.
//!
//! The logged-in user is a [`CurrentUser`] stored in the session. Pages that
//! need one take [`RequireAuth`]; pages that merely adapt take [`OptionalAuth`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/users/login/";

/// Extractor that requires a logged-in user.
///
/// HTML requests are redirected to the login page with a `next` parameter;
/// `/api/` requests get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, returning to `next` afterwards.
    RedirectToLogin { next: String },
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `next` after a successful login.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if parts.uri.path().starts_with("/api/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin {
                        next: parts.uri.path().to_string(),
                    }
                }
            })?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop the whole session, cart and promo flags included, and
/// delete it from the store. Later writes start a fresh session.
///
/// # Errors
///
/// Returns an error if the store cannot delete the session.
pub async fn end_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_end_session_forgets_user_and_cart() {
        use std::sync::Arc;

        use rust_decimal::Decimal;
        use tower_sessions::MemoryStore;

        use metra_core::cart::Cart;
        use metra_core::{ProductId, UserId};

        use crate::middleware::{load_cart, save_cart};

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let user = CurrentUser {
            id: UserId::new(3),
            username: "grace".to_string(),
            is_staff: false,
        };
        set_current_user(&session, &user).await.unwrap();
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), Decimal::new(1_000, 2), 1, 5).unwrap();
        cart.apply_promo("WELCOME10");
        save_cart(&session, &cart).await.unwrap();

        end_session(&session).await.unwrap();

        let remembered: Option<CurrentUser> =
            session.get(session_keys::CURRENT_USER).await.unwrap();
        assert!(remembered.is_none());
        let cart = load_cart(&session).await;
        assert!(cart.is_empty());
        assert_eq!(cart.discount_percentage(), 0);
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(login_url("/orders/"), "/users/login/?next=%2Forders%2F");
    }

    #[test]
    fn test_rejection_responses() {
        let redirect = AuthRejection::RedirectToLogin {
            next: "/checkout/".to_string(),
        }
        .into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/users/login/?next=%2Fcheckout%2F")
        );
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
