//! Per-request page context and session helpers.
//!
//! Every full page renders the same chrome: the logged-in user, the cart
//! badge and any pending flash messages. [`PageContext`] gathers those from
//! the session in one extractor; flash messages are consumed as they are read.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use metra_core::cart::Cart;

use crate::models::{CurrentUser, FlashLevel, FlashMessage, session_keys};

// =============================================================================
// Page Context
// =============================================================================

/// Data shared by every rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub messages: Vec<FlashMessage>,
}

impl PageContext {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.username.as_str())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let cart_count = load_cart(session).await.len();
        let messages = take_flashes(session).await;

        Ok(Self {
            user,
            cart_count,
            messages,
        })
    }
}

/// `true` when the request came from page JavaScript
/// (`X-Requested-With: XMLHttpRequest`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsAjax(pub bool);

impl<S> FromRequestParts<S> for IsAjax
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ajax = parts
            .headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
        Ok(Self(ajax))
    }
}

// =============================================================================
// Flash Messages
// =============================================================================

/// Queue a message for the next rendered page.
pub async fn flash(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut pending = session
        .get::<Vec<FlashMessage>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(FlashMessage {
        level,
        text: text.into(),
    });
    if let Err(e) = session.insert(session_keys::FLASH, pending).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return all pending messages.
pub async fn take_flashes(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(session_keys::FLASH).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}

// =============================================================================
// Session Cart
// =============================================================================

/// The visitor's cart, or an empty one.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use metra_core::{ProductId, UserId};

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_consumed_once() {
        let session = session();
        flash(&session, FlashLevel::Success, "Saved").await;
        flash(&session, FlashLevel::Error, "Oops").await;

        let messages = take_flashes(&session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, FlashLevel::Success);
        assert_eq!(messages[1].text, "Oops");
        assert!(take_flashes(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = session();
        assert!(load_cart(&session).await.is_empty());

        let mut cart = Cart::new();
        cart.add(ProductId::new(4), Decimal::new(1_000, 2), 2, 10)
            .unwrap();
        save_cart(&session, &cart).await.unwrap();

        assert_eq!(load_cart(&session).await.len(), 2);
    }

    #[tokio::test]
    async fn test_page_context_reads_session() {
        let session = session();
        session
            .insert(
                session_keys::CURRENT_USER,
                CurrentUser {
                    id: UserId::new(1),
                    username: "ada".to_string(),
                    is_staff: false,
                },
            )
            .await
            .unwrap();
        flash(&session, FlashLevel::Info, "Hello").await;

        let (mut parts, ()) = Request::new(()).into_parts();
        parts.extensions.insert(session);
        let page = PageContext::from_request_parts(&mut parts, &()).await.unwrap();

        assert!(page.is_authenticated());
        assert_eq!(page.username(), "ada");
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.cart_count, 0);
    }

    #[tokio::test]
    async fn test_is_ajax_header() {
        let (mut parts, ()) = Request::builder()
            .header("X-Requested-With", "XMLHttpRequest")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(IsAjax::from_request_parts(&mut parts, &()).await.unwrap(), IsAjax(true));

        let (mut parts, ()) = Request::new(()).into_parts();
        assert_eq!(IsAjax::from_request_parts(&mut parts, &()).await.unwrap(), IsAjax(false));
    }
}
