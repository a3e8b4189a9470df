//! Catalog route handlers: listings, product detail and reviews.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use metra_core::search::tokenize;

use crate::db::analytics::Counter;
use crate::db::catalog::{PAGE_SIZE, ProductFilter, ProductSort};
use crate::db::reviews::ReviewWrite;
use crate::db::{AnalyticsRepository, CatalogRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{IsAjax, OptionalAuth, PageContext, flash, login_url};
use crate::models::review::validate_review;
use crate::models::{Category, FlashLevel, Product, Review};
use crate::state::AppState;

// =============================================================================
// Pagination
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// A resolved listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub number: i64,
    pub total_pages: i64,
}

impl Pagination {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn next(&self) -> i64 {
        self.number + 1
    }

    #[must_use]
    pub const fn previous(&self) -> i64 {
        self.number - 1
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}

/// Outcome of resolving the `page` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Page(Pagination),
    /// A valid number past the last page.
    OutOfRange { last: Pagination },
}

/// Resolve a raw `page` value against a result count.
///
/// Missing or non-numeric values mean page 1. There is always at least one
/// page, even with no results.
#[must_use]
pub fn resolve_page(raw: Option<&str>, total_items: i64) -> PageRequest {
    let total_pages = ((total_items + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let requested = raw.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1);

    if (1..=total_pages).contains(&requested) {
        PageRequest::Page(Pagination {
            number: requested,
            total_pages,
        })
    } else {
        PageRequest::OutOfRange {
            last: Pagination {
                number: total_pages,
                total_pages,
            },
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub category: Option<Category>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub pagination: Pagination,
    pub search_query: String,
    pub sort: &'static str,
}

/// Product grid fragment returned to infinite scroll.
#[derive(Template)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate<'a> {
    pub products: &'a [Product],
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub reviews: Vec<Review>,
    pub related_products: Vec<Product>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    IsAjax(ajax): IsAjax,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    listing(&state, page, ajax, query, None).await
}

/// Display the listing for one category.
#[instrument(skip(state, page))]
pub async fn category(
    State(state): State<AppState>,
    page: PageContext,
    IsAjax(ajax): IsAjax,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let category = CatalogRepository::new(state.pool())
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    listing(&state, page, ajax, query, Some(category)).await
}

async fn listing(
    state: &AppState,
    page: PageContext,
    ajax: bool,
    query: ListingQuery,
    category: Option<Category>,
) -> Result<Response> {
    let catalog = CatalogRepository::new(state.pool());
    let search_query = query.search.unwrap_or_default();
    let sort = ProductSort::parse(query.sort.as_deref());
    let filter = ProductFilter {
        category: category.as_ref().map(|c| c.id),
        tokens: tokenize(&search_query),
    };

    let total = catalog.count_products(&filter).await?;
    let pagination = match resolve_page(query.page.as_deref(), total) {
        PageRequest::Page(p) => p,
        PageRequest::OutOfRange { .. } if ajax => {
            return Ok(Json(json!({ "has_more": false })).into_response());
        }
        PageRequest::OutOfRange { last } => last,
    };

    let products = catalog
        .list_products(&filter, sort, PAGE_SIZE, pagination.offset())
        .await?;

    if ajax {
        let html = ProductGridTemplate {
            products: &products,
        }
        .render()?;
        return Ok(Json(json!({ "html": html, "has_more": pagination.has_next() })).into_response());
    }

    Ok(ProductsIndexTemplate {
        page,
        category,
        categories: catalog.list_categories().await?,
        products,
        pagination,
        search_query,
        sort: sort.as_str(),
    }
    .into_response())
}

/// Display a product with its reviews and related products.
///
/// Each view is counted in the product's analytics.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .get_available_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    AnalyticsRepository::new(state.pool())
        .record(product.id, Counter::View)
        .await;

    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product.id)
        .await?;
    let related_products = catalog.related(&product).await?;

    Ok(ProductShowTemplate {
        page,
        product,
        reviews,
        related_products,
    })
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<String>,
    #[serde(default)]
    pub comment: String,
}

/// Create or update the logged-in user's review of a product.
#[instrument(skip(state, session, user, form))]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let product = CatalogRepository::new(state.pool())
        .get_available_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let Some(user) = user else {
        flash(
            &session,
            FlashLevel::Warning,
            "You need to be logged in to leave a review.",
        )
        .await;
        return Ok(Redirect::to(&login_url(&product.url())));
    };

    let rating = form
        .rating
        .as_deref()
        .and_then(|r| r.trim().parse::<i16>().ok())
        .unwrap_or(0);

    match validate_review(rating, &form.comment) {
        Ok(comment) => {
            let written = ReviewRepository::new(state.pool())
                .upsert(product.id, user.id, rating, &comment)
                .await?;
            let message = match written {
                ReviewWrite::Created => "Thank you for your review!",
                ReviewWrite::Updated => "Your review has been updated!",
            };
            flash(&session, FlashLevel::Success, message).await;
        }
        Err(e) => flash(&session, FlashLevel::Error, e.to_string()).await,
    }

    Ok(Redirect::to(&product.url()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_page_defaults_to_first() {
        assert_eq!(
            resolve_page(None, 30),
            PageRequest::Page(Pagination {
                number: 1,
                total_pages: 3
            })
        );
        assert_eq!(
            resolve_page(Some("abc"), 30),
            PageRequest::Page(Pagination {
                number: 1,
                total_pages: 3
            })
        );
    }

    #[test]
    fn test_resolve_page_out_of_range_points_at_last() {
        assert_eq!(
            resolve_page(Some("9"), 13),
            PageRequest::OutOfRange {
                last: Pagination {
                    number: 2,
                    total_pages: 2
                }
            }
        );
    }

    #[test]
    fn test_empty_listing_still_has_one_page() {
        let PageRequest::Page(p) = resolve_page(Some("1"), 0) else {
            panic!("page 1 of an empty listing should resolve");
        };
        assert_eq!(p.total_pages, 1);
        assert!(!p.has_next());
        assert!(!p.has_previous());
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_navigation() {
        let p = Pagination {
            number: 2,
            total_pages: 3,
        };
        assert!(p.has_next());
        assert!(p.has_previous());
        assert_eq!(p.offset(), 12);
        assert_eq!((p.previous(), p.next()), (1, 3));
    }
}
