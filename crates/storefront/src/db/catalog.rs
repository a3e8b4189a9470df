//! Catalog repository: categories and products.
//!
//! Product searches bind the query's tokens as an array of `ILIKE` patterns.
//! A product matches when no pattern fails to match all three of its name,
//! description and category name, which is AND over tokens and OR over fields.

use sqlx::PgPool;

use metra_core::search::like_pattern;
use metra_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.category_id, c.name AS category_name, c.slug AS category_slug, \
           p.name, p.slug, p.image, p.description, p.short_description, p.price, \
           p.sale_price, p.stock, p.available, p.featured, p.average_rating, p.created_at \
    FROM store.product p \
    JOIN store.category c ON c.id = p.category_id";

const LISTING_FILTER: &str = "\
    WHERE p.available \
      AND ($1::int IS NULL OR p.category_id = $1) \
      AND NOT EXISTS ( \
          SELECT 1 FROM unnest($2::text[]) AS t(pat) \
          WHERE NOT (p.name ILIKE t.pat OR p.description ILIKE t.pat OR c.name ILIKE t.pat))";

/// Products per listing page.
pub const PAGE_SIZE: i64 = 12;

/// Products shown on the home page.
pub const HOME_PRODUCTS: i64 = 8;

/// Related products shown on a detail page.
pub const RELATED_PRODUCTS: i64 = 4;

/// Listing order selected by the `sort` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl ProductSort {
    /// Unknown or missing values fall back to name order.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("newest") => Self::Newest,
            _ => Self::Name,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Newest => "newest",
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::Name => "p.name ASC, p.id ASC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id ASC",
            Self::Newest => "p.created_at DESC, p.id DESC",
        }
    }
}

/// Filter for available-product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    /// Lower-cased search tokens; empty matches everything.
    pub tokens: Vec<String>,
}

impl ProductFilter {
    fn patterns(&self) -> Vec<String> {
        self.tokens.iter().map(|t| like_pattern(t)).collect()
    }
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, image FROM store.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Names of all categories, for search suggestions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_names(&self) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM store.category ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(names)
    }

    /// Find a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, image FROM store.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// The first available products in name order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn home_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.available ORDER BY p.name, p.id LIMIT $1"
        ))
        .bind(HOME_PRODUCTS)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Count available products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_products(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM store.product p \
             JOIN store.category c ON c.id = p.category_id {LISTING_FILTER}"
        ))
        .bind(filter.category)
        .bind(filter.patterns())
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// One page of available products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} {LISTING_FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
            sort.order_by()
        ))
        .bind(filter.category)
        .bind(filter.patterns())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Live-search results: available products matching every token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        tokens: &[String],
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let filter = ProductFilter {
            category: None,
            tokens: tokens.to_vec(),
        };
        self.list_products(&filter, ProductSort::Name, limit, 0).await
    }

    /// An available product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_available_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.slug = $1 AND p.available"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// An available product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_available_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = $1 AND p.available"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// A product by ID, available or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Products by ID, in no particular order. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Other available products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(&self, product: &Product) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.category_id = $1 AND p.available AND p.id <> $2 \
             ORDER BY p.name, p.id LIMIT $3"
        ))
        .bind(product.category_id)
        .bind(product.id)
        .bind(RELATED_PRODUCTS)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
