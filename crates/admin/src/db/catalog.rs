//! Catalog repositories: categories and products.

use sqlx::PgPool;

use metra_core::{CategoryId, ProductId};

use super::{RepositoryError, order_by, search_clause, search_patterns};
use crate::models::{Category, CategoryPayload, Product, ProductPayload};

const CATEGORY_ORDERING: &[(&str, &str)] = &[("name", "c.name"), ("id", "c.id")];

const PRODUCT_ORDERING: &[(&str, &str)] = &[
    ("name", "p.name"),
    ("price", "p.price"),
    ("stock", "p.stock"),
    ("created", "p.created_at"),
];

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.category_id AS category, c.name AS category_name, p.name, p.slug, \
           p.image, p.description, p.short_description, p.price, p.sale_price, p.stock, \
           p.available, p.featured, p.average_rating, p.created_at AS created, \
           p.updated_at AS updated, \
           (SELECT COUNT(*) FROM store.order_item i WHERE i.product_id = p.id) AS sales_count \
    FROM store.product p \
    JOIN store.category c ON c.id = p.category_id";

/// List parameters shared by the category and product endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListQuery<'q> {
    pub search: Option<&'q str>,
    pub ordering: Option<&'q str>,
}

/// Repository for category management.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Categories matching `search` over name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ListQuery<'_>) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!(
            "SELECT c.id, c.name, c.slug, c.description, c.image FROM store.category c \
             WHERE {} ORDER BY {}, c.id",
            search_clause("$1", &["c.name", "c.description"]),
            order_by(query.ordering, CATEGORY_ORDERING, "c.name ASC"),
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(search_patterns(query.search))
            .fetch_all(self.pool)
            .await?;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this ID.
    pub async fn get(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, image FROM store.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, payload: &CategoryPayload) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO store.category (name, slug, description, image) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, slug, description, image",
        )
        .bind(&payload.name)
        .bind(payload.slug())
        .bind(&payload.description)
        .bind(&payload.image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Category with this slug"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        payload: &CategoryPayload,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "UPDATE store.category SET name = $2, slug = $3, description = $4, image = $5 \
             WHERE id = $1 \
             RETURNING id, name, slug, description, image",
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.slug())
        .bind(&payload.description)
        .bind(&payload.image)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Category with this slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category and, by cascade, its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` if one of its products has been ordered.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "Category"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Repository for product management.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching `search` over name, description and category name,
    /// optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<CategoryId>,
        query: &ListQuery<'_>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE ($1::int IS NULL OR p.category_id = $1) AND {} \
             ORDER BY {}, p.id",
            search_clause("$2", &["p.name", "p.description", "c.name"]),
            order_by(query.ordering, PRODUCT_ORDERING, "p.name ASC"),
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .bind(search_patterns(query.search))
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a taken slug or unknown category.
    pub async fn create(&self, payload: &ProductPayload) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO store.product \
                 (category_id, name, slug, image, description, short_description, \
                  price, sale_price, stock, available, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(payload.category)
        .bind(&payload.name)
        .bind(payload.slug())
        .bind(&payload.image)
        .bind(&payload.description)
        .bind(&payload.short_description)
        .bind(payload.price)
        .bind(payload.sale_price)
        .bind(payload.stock)
        .bind(payload.available)
        .bind(payload.featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Product"))?;

        tracing::info!(%id, slug = payload.slug(), "Product created");
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` for a taken slug or unknown category.
    pub async fn update(
        &self,
        id: ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.product SET \
                 category_id = $2, name = $3, slug = $4, image = $5, description = $6, \
                 short_description = $7, price = $8, sale_price = $9, stock = $10, \
                 available = $11, featured = $12, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(payload.category)
        .bind(&payload.name)
        .bind(payload.slug())
        .bind(&payload.image)
        .bind(&payload.description)
        .bind(&payload.short_description)
        .bind(payload.price)
        .bind(payload.sale_price)
        .bind(payload.stock)
        .bind(payload.available)
        .bind(payload.featured)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await
    }

    /// Set a product's stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.product SET stock = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(stock)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "Product"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(%id, stock, "Stock updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID, or
    /// `RepositoryError::Conflict` if the product has been ordered.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "Product"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
