//! Checkout, order confirmation and order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use metra_core::{Email, OrderId};

use crate::db::orders::CheckoutError;
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{
    OptionalAuth, PageContext, RequireAuth, flash, load_cart, login_url, save_cart,
};
use crate::models::{CurrentUser, FlashLevel, Order, OrderDetails, OrderLine, User};
use crate::routes::cart::{CartView, cart_view, reconcile};
use crate::state::AppState;

const CHECKOUT_PATH: &str = "/checkout/";
const CART_PATH: &str = "/cart/";
const MAX_FIELD_LENGTH: usize = 250;
const MAX_POSTAL_CODE_LENGTH: usize = 20;
const MAX_CITY_LENGTH: usize = 100;

// =============================================================================
// Form
// =============================================================================

/// Checkout form data. Also used to prefill the form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
}

impl CheckoutForm {
    /// Prefill from the account.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.to_string(),
            ..Self::default()
        }
    }

    /// Validate into order details. A blank shipping address means
    /// "ship to the billing address".
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn validate(&self) -> std::result::Result<OrderDetails, Vec<String>> {
        let mut errors = Vec::new();
        let mut field = |label: &str, value: &str, max: usize| {
            let value = value.trim();
            if value.is_empty() {
                errors.push(format!("{label} is required."));
            } else if value.chars().count() > max {
                errors.push(format!("{label} must be at most {max} characters."));
            }
            value.to_string()
        };

        let first_name = field("First name", &self.first_name, MAX_FIELD_LENGTH);
        let last_name = field("Last name", &self.last_name, MAX_FIELD_LENGTH);
        let address = field("Address", &self.address, MAX_FIELD_LENGTH);
        let postal_code = field("Postal code", &self.postal_code, MAX_POSTAL_CODE_LENGTH);
        let city = field("City", &self.city, MAX_CITY_LENGTH);

        let shipping_address = match self.shipping_address.trim() {
            "" => address.clone(),
            other if other.chars().count() > MAX_FIELD_LENGTH => {
                errors.push(format!(
                    "Shipping address must be at most {MAX_FIELD_LENGTH} characters."
                ));
                String::new()
            }
            other => other.to_string(),
        };

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.push("Enter a valid email address.".to_string());
                None
            }
        };

        match email {
            Some(email) if errors.is_empty() => Ok(OrderDetails {
                first_name,
                last_name,
                email,
                address,
                shipping_address,
                postal_code,
                city,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub form: CheckoutForm,
    pub errors: Vec<String>,
    pub cart: CartView,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub page: PageContext,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Guard shared by both checkout handlers: the cart must have items and
/// the visitor must be logged in.
async fn checkout_guard(
    session: &Session,
    user: Option<CurrentUser>,
) -> std::result::Result<CurrentUser, Redirect> {
    if load_cart(session).await.is_empty() {
        flash(
            session,
            FlashLevel::Warning,
            "Your cart is empty. Please add items before checkout.",
        )
        .await;
        return Err(Redirect::to("/products/"));
    }
    match user {
        Some(user) => Ok(user),
        None => {
            flash(
                session,
                FlashLevel::Info,
                "Please log in to continue with checkout.",
            )
            .await;
            Err(Redirect::to(&login_url(CHECKOUT_PATH)))
        }
    }
}

/// Display the checkout form, prefilled from the account.
#[instrument(skip(state, page, session, user))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let user = match checkout_guard(&session, user).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let form = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .map(|u| CheckoutForm::for_user(&u))
        .unwrap_or_default();
    let mut cart = load_cart(&session).await;
    let cart = cart_view(&state, &session, &mut cart).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    Ok(CheckoutTemplate {
        page,
        form,
        errors: Vec::new(),
        cart,
    }
    .into_response())
}

/// Place the order.
#[instrument(skip(state, page, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let user = match checkout_guard(&session, user).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let mut cart = load_cart(&session).await;

    // Pruning changes the total, so show the cart again.
    let (products, pruned) = reconcile(&state, &session, &mut cart).await?;
    if pruned {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let details = match form.validate() {
        Ok(details) => details,
        Err(errors) => {
            return Ok(CheckoutTemplate {
                page,
                form,
                errors,
                cart: CartView::build(&cart, &products),
            }
            .into_response());
        }
    };

    add_breadcrumb("checkout", "Placing order", None);

    let order_id = match OrderRepository::new(state.pool())
        .place_order(user.id, &details, &cart)
        .await
    {
        Ok(id) => id,
        Err(e @ CheckoutError::Repository(_)) => return Err(e.into()),
        Err(e) => {
            tracing::info!(user_id = %user.id, reason = %e, "Checkout rejected");
            flash(&session, FlashLevel::Error, e.to_string()).await;
            return Ok(Redirect::to(CART_PATH).into_response());
        }
    };

    cart.clear();
    save_cart(&session, &cart).await?;
    flash(
        &session,
        FlashLevel::Success,
        "Your order has been placed successfully!",
    )
    .await;

    Ok(Redirect::to(&format!("/order/confirmation/{order_id}/")).into_response())
}

/// Confirmation page, visible to the order's owner only.
#[instrument(skip(state, page, user))]
pub async fn confirmation(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<ConfirmationTemplate> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(order_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    let lines = orders.lines(order.id).await?;

    Ok(ConfirmationTemplate { page, order, lines })
}

/// The logged-in user's orders, newest first.
#[instrument(skip(state, page, user))]
pub async fn orders(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(OrdersTemplate { page, orders })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> CheckoutForm {
        CheckoutForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Row".to_string(),
            shipping_address: String::new(),
            postal_code: "N1 9GU".to_string(),
            city: "London".to_string(),
        }
    }

    #[test]
    fn test_blank_shipping_address_uses_billing_address() {
        let details = filled().validate().unwrap();
        assert_eq!(details.shipping_address, "12 Analytical Row");
        assert_eq!(details.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let form = CheckoutForm {
            first_name: "  ".to_string(),
            email: "nope".to_string(),
            postal_code: "x".repeat(21),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "First name is required.",
                "Postal code must be at most 20 characters.",
                "Enter a valid email address.",
            ]
        );
    }
}
