//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Category, Product};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

/// Display the home page: the first available products and every category.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> Result<HomeTemplate> {
    let catalog = crate::db::CatalogRepository::new(state.pool());
    let products = catalog.home_products().await?;
    let categories = catalog.list_categories().await?;

    Ok(HomeTemplate {
        page,
        products,
        categories,
    })
}
