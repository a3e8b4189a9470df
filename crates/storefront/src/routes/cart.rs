//! Cart route handlers.
//!
//! The cart lives in the session (see [`crate::middleware::load_cart`]).
//! Every mutating handler answers page JavaScript (`X-Requested-With`) with
//! JSON carrying a re-rendered cart preview, and plain form posts with a
//! redirect plus a flash message.

use std::collections::{HashMap, HashSet};

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use metra_core::cart::{Cart, CartError, CartTotals, PromoOutcome};
use metra_core::{Price, ProductId};

use crate::db::analytics::Counter;
use crate::db::{AnalyticsRepository, CatalogRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{IsAjax, PageContext, flash, load_cart, save_cart};
use crate::models::{FlashLevel, Product};
use crate::state::AppState;

const CART_PATH: &str = "/cart/";

const UNAVAILABLE_REMOVED: &str =
    "Some items in your cart are no longer available and have been removed.";

// =============================================================================
// View Types
// =============================================================================

/// One cart line ready for display.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub url: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub stock: i32,
    pub price: Price,
    pub line_total: Price,
}

/// A cart ready for display.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub discount_percentage: u8,
    pub subtotal: Price,
    pub discount: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
    pub free_shipping: bool,
}

impl CartView {
    /// Join cart lines with their products.
    ///
    /// Expects a cart already passed through [`prune_unbuyable`]; a line
    /// without a product in `products` is not shown.
    #[must_use]
    pub fn build(cart: &Cart, products: &[Product]) -> Self {
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let items = cart
            .lines()
            .iter()
            .filter_map(|line| {
                by_id.get(&line.product_id).map(|product| CartItemView {
                    product_id: line.product_id,
                    name: product.name.clone(),
                    url: product.url(),
                    image: product.image.clone(),
                    quantity: line.quantity,
                    stock: product.stock,
                    price: Price::new(line.price),
                    line_total: Price::new(line.total()),
                })
            })
            .collect();

        let totals: CartTotals = cart.totals();
        Self {
            items,
            item_count: cart.len(),
            discount_percentage: cart.discount_percentage(),
            subtotal: Price::new(totals.subtotal),
            discount: Price::new(totals.discount),
            shipping: Price::new(totals.shipping),
            tax: Price::new(totals.tax),
            total: Price::new(totals.total),
            free_shipping: totals.free_shipping,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discount_percentage > 0
    }
}

/// Drop lines whose product was deleted or taken off sale. Returns `true`
/// if anything was dropped.
#[must_use]
pub fn prune_unbuyable(cart: &mut Cart, products: &[Product]) -> bool {
    let buyable: HashSet<ProductId> = products
        .iter()
        .filter(|p| p.available)
        .map(|p| p.id)
        .collect();
    cart.retain(|id| buyable.contains(&id)) > 0
}

/// Load the products behind a cart and prune it against them.
///
/// A pruned cart is saved straight away and the shopper gets a warning.
/// Returns the products and whether anything was pruned.
///
/// # Errors
///
/// Returns `AppError::Database` if the product lookup fails, or
/// `AppError::Session` if the pruned cart cannot be saved.
pub async fn reconcile(
    state: &AppState,
    session: &Session,
    cart: &mut Cart,
) -> Result<(Vec<Product>, bool)> {
    let ids: Vec<ProductId> = cart.product_ids().collect();
    let products = CatalogRepository::new(state.pool()).get_many(&ids).await?;
    let pruned = prune_unbuyable(cart, &products);
    if pruned {
        tracing::info!(remaining = cart.lines().len(), "Dropped unavailable cart lines");
        save_cart(session, cart).await?;
        flash(session, FlashLevel::Warning, UNAVAILABLE_REMOVED).await;
    }
    Ok((products, pruned))
}

/// Reconcile a cart with the catalog and build its view.
///
/// # Errors
///
/// See [`reconcile`].
pub async fn cart_view(
    state: &AppState,
    session: &Session,
    cart: &mut Cart,
) -> Result<CartView> {
    let (products, _) = reconcile(state, session, cart).await?;
    Ok(CartView::build(cart, &products))
}

/// Two-decimal string used in JSON bodies.
fn amount(value: Decimal) -> String {
    format!("{:.2}", metra_core::round_cents(value))
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart preview fragment (header dropdown).
#[derive(Template)]
#[template(path = "partials/cart_preview.html")]
pub struct CartPreviewTemplate<'a> {
    pub cart: &'a CartView,
}

async fn preview_html(
    state: &AppState,
    session: &Session,
    cart: &mut Cart,
) -> Result<String> {
    let view = cart_view(state, session, cart).await?;
    Ok(CartPreviewTemplate { cart: &view }.render()?)
}

// =============================================================================
// Forms
// =============================================================================

/// Quantity form data for add and update.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: Option<String>,
}

impl QuantityForm {
    /// Parsed quantity; missing means `default`, garbage or negatives are rejected.
    fn quantity(&self, default: u32) -> std::result::Result<u32, CartError> {
        match self.quantity.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse::<u32>().map_err(|_| CartError::InvalidQuantity),
        }
    }
}

/// Promo code form data.
#[derive(Debug, Deserialize)]
pub struct PromoForm {
    #[serde(default)]
    pub code: String,
}

/// A cart rule violation, answered as JSON 400 or flash + redirect.
async fn reject(session: &Session, ajax: bool, err: &CartError, back_to: &str) -> Response {
    if ajax {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response();
    }
    flash(session, FlashLevel::Error, err.to_string()).await;
    Redirect::to(back_to).into_response()
}

/// A product that can still be bought.
async fn product_or_404(state: &AppState, product_id: ProductId) -> Result<Product> {
    CatalogRepository::new(state.pool())
        .get_available_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, page, session))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
) -> Result<CartShowTemplate> {
    let mut cart = load_cart(&session).await;
    let cart = cart_view(&state, &session, &mut cart).await?;
    Ok(CartShowTemplate { page, cart })
}

/// Add a quantity of a product (default 1).
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    IsAjax(ajax): IsAjax,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let product = product_or_404(&state, product_id).await?;
    let mut cart = load_cart(&session).await;

    let added = form
        .quantity(1)
        .and_then(|qty| cart.add(product.id, product.price, qty, product.stock));
    if let Err(e) = added {
        return Ok(reject(&session, ajax, &e, &product.url()).await);
    }
    save_cart(&session, &cart).await?;

    AnalyticsRepository::new(state.pool())
        .record(product.id, Counter::CartAddition)
        .await;
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product.id.to_string())]),
    );

    let message = format!("{} added to cart", product.name);
    if ajax {
        let cart_html = preview_html(&state, &session, &mut cart).await?;
        return Ok(Json(json!({
            "cart_html": cart_html,
            "cart_total": cart.len(),
            "success": true,
            "message": message,
        }))
        .into_response());
    }

    flash(&session, FlashLevel::Success, message).await;
    Ok(Redirect::to(CART_PATH).into_response())
}

/// Replace a line's quantity; 0 removes the line.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    IsAjax(ajax): IsAjax,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let product = product_or_404(&state, product_id).await?;
    let mut cart = load_cart(&session).await;

    let updated = form
        .quantity(1)
        .and_then(|qty| cart.set_quantity(product.id, product.price, qty, product.stock));
    if let Err(e) = updated {
        return Ok(reject(&session, ajax, &e, CART_PATH).await);
    }
    save_cart(&session, &cart).await?;

    if ajax {
        let cart_html = preview_html(&state, &session, &mut cart).await?;
        return Ok(Json(json!({
            "cart_html": cart_html,
            "cart_total": cart.len(),
            "item_total": amount(cart.item_total(product.id)),
            "cart_total_price": amount(cart.totals().total),
        }))
        .into_response());
    }

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Remove a product from the cart.
///
/// Works on the cart line alone, so a product deleted from the catalog can
/// still be removed. 404 only when neither the line nor the product exists.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    IsAjax(ajax): IsAjax,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    let name = CatalogRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .map(|product| product.name);
    let mut cart = load_cart(&session).await;
    let removed = cart.remove(product_id);
    let Some(name) = name.or_else(|| removed.then(|| "Item".to_string())) else {
        return Err(AppError::NotFound(format!("product {product_id}")));
    };
    if removed {
        save_cart(&session, &cart).await?;
    }

    let message = format!("{name} removed from cart");
    if ajax {
        let cart_html = preview_html(&state, &session, &mut cart).await?;
        return Ok(Json(json!({
            "cart_html": cart_html,
            "cart_total": cart.len(),
            "cart_total_price": amount(cart.totals().total),
            "success": true,
            "message": message,
        }))
        .into_response());
    }

    flash(&session, FlashLevel::Success, message).await;
    Ok(Redirect::to(CART_PATH).into_response())
}

/// Empty the cart and drop both promo flags.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await?;
    flash(&session, FlashLevel::Success, "Your cart has been cleared.").await;
    Ok(Redirect::to(CART_PATH))
}

/// Apply a promo code.
#[instrument(skip(session))]
pub async fn apply_promo(
    session: Session,
    IsAjax(ajax): IsAjax,
    Form(form): Form<PromoForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    let outcome = cart.apply_promo(&form.code);
    if matches!(outcome, PromoOutcome::Applied(_)) {
        save_cart(&session, &cart).await?;
    }

    let (level, status, success) = match outcome {
        PromoOutcome::Applied(_) => (FlashLevel::Success, StatusCode::OK, true),
        PromoOutcome::AlreadyApplied(_) => (FlashLevel::Info, StatusCode::OK, false),
        PromoOutcome::Invalid => (FlashLevel::Error, StatusCode::BAD_REQUEST, false),
    };

    if ajax {
        return Ok((
            status,
            Json(json!({
                "success": success,
                "message": outcome.message(),
                "cart_total_price": amount(cart.totals().total),
            })),
        )
            .into_response());
    }

    flash(&session, level, outcome.message()).await;
    Ok(Redirect::to(CART_PATH).into_response())
}

/// Cart preview fragment for the header dropdown.
#[instrument(skip(state, session))]
pub async fn preview(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>> {
    let mut cart = load_cart(&session).await;
    let cart_html = preview_html(&state, &session, &mut cart).await?;
    Ok(Json(json!({ "cart_html": cart_html })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use metra_core::CategoryId;

    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            category_name: "Kitchen".to_string(),
            category_slug: "kitchen".to_string(),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            image: None,
            description: String::new(),
            short_description: String::new(),
            price: Decimal::new(cents, 2),
            sale_price: None,
            stock: 10,
            available: true,
            featured: false,
            average_rating: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_uses_snapshot_price() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), Decimal::new(2_000, 2), 2, 10).unwrap();

        let view = CartView::build(&cart, &[product(1, 2_500)]);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.items[0].price.to_string(), "$20.00");
        assert_eq!(view.items[0].line_total.to_string(), "$40.00");
        assert_eq!(view.subtotal.to_string(), "$40.00");
        assert!(!view.has_discount());
    }

    #[test]
    fn test_deleted_product_leaves_cart_and_totals() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), Decimal::new(2_000, 2), 1, 10).unwrap();
        cart.add(ProductId::new(2), Decimal::new(9_999, 2), 1, 10).unwrap();
        let products = [product(1, 2_000)];

        assert!(prune_unbuyable(&mut cart, &products));
        let view = CartView::build(&cart, &products);

        let shown: Vec<String> = view.items.iter().map(|i| i.price.to_string()).collect();
        assert_eq!(shown, ["$20.00"]);
        assert_eq!(view.item_count, 1);
        assert_eq!(view.subtotal.to_string(), "$20.00");
        assert_eq!(view.total.to_string(), "$26.50");
        assert!(!prune_unbuyable(&mut cart, &products));
    }

    #[test]
    fn test_unavailable_product_is_pruned() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), Decimal::new(2_000, 2), 1, 10).unwrap();
        cart.add(ProductId::new(3), Decimal::new(500, 2), 2, 10).unwrap();
        let mut retired = product(3, 500);
        retired.available = false;

        assert!(prune_unbuyable(&mut cart, &[product(1, 2_000), retired]));
        assert_eq!(cart.product_ids().collect::<Vec<_>>(), [ProductId::new(1)]);
    }

    #[test]
    fn test_quantity_form_parsing() {
        let form = |q: Option<&str>| QuantityForm {
            quantity: q.map(str::to_string),
        };
        assert_eq!(form(None).quantity(1).unwrap(), 1);
        assert_eq!(form(Some(" 3 ")).quantity(1).unwrap(), 3);
        assert_eq!(form(Some("-1")).quantity(1), Err(CartError::InvalidQuantity));
        assert_eq!(form(Some("two")).quantity(1), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_amount_formats_two_places() {
        assert_eq!(amount(Decimal::new(5, 0)), "5.00");
        assert_eq!(amount(Decimal::new(12_345, 3)), "12.35");
    }
}
