//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Home page
//! GET  /health                          - Health check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Catalog
//! GET  /products/                       - Listing (search, sort, page; AJAX → JSON)
//! GET  /category/{slug}/                - Listing filtered by category
//! GET  /product/{slug}/                 - Product detail
//! POST /product/{slug}/review/          - Create or update the user's review
//!
//! # Cart (session)
//! GET  /cart/                           - Cart page
//! POST /cart/add/{product_id}/          - Add quantity
//! POST /cart/update/{product_id}/       - Set quantity
//! POST /cart/remove/{product_id}/       - Remove line
//! POST /cart/clear/                     - Empty the cart and promos
//! POST /cart/apply-promo/               - Apply WELCOME10 / FREESHIP
//!
//! # JSON API
//! GET  /api/products/search/?q=         - Live search (rate limited)
//! GET  /api/cart/preview/               - Cart preview fragment
//!
//! # Checkout & orders
//! GET  /checkout/                       - Checkout form
//! POST /checkout/                       - Place order
//! GET  /order/confirmation/{order_id}/  - Order confirmation
//! GET  /orders/                         - Order history
//!
//! # Users
//! GET  /users/signup/  POST             - Registration (rate limited)
//! GET  /users/login/   POST             - Login (rate limited)
//! POST /users/logout/                   - Logout
//! GET  /users/profile/                  - Profile
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod search;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, search_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::show))
        .route("/cart/add/{product_id}/", post(cart::add))
        .route("/cart/update/{product_id}/", post(cart::update))
        .route("/cart/remove/{product_id}/", post(cart::remove))
        .route("/cart/clear/", post(cart::clear))
        .route("/cart/apply-promo/", post(cart::apply_promo))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products/search/",
            get(search::api).layer(search_rate_limiter()),
        )
        .route("/api/cart/preview/", get(cart::preview))
}

/// Create the user account routes router.
pub fn user_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/users/signup/", get(users::signup_page).post(users::signup))
        .route("/users/login/", get(users::login_page).post(users::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/users/logout/", post(users::logout))
        .route("/users/profile/", get(users::profile))
}

/// Create all routes for the storefront.
///
/// Paths keep their trailing slash; sub-routers are merged rather than
/// nested so `/cart/` and friends match exactly.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        // Catalog
        .route("/products/", get(products::index))
        .route("/category/{slug}/", get(products::category))
        .route("/product/{slug}/", get(products::show))
        .route("/product/{slug}/review/", post(products::review))
        // Checkout and orders
        .route("/checkout/", get(checkout::show).post(checkout::submit))
        .route(
            "/order/confirmation/{order_id}/",
            get(checkout::confirmation),
        )
        .route("/orders/", get(checkout::orders))
        .merge(cart_routes())
        .merge(user_routes())
        .merge(api_routes())
}
