//! Order repository and the checkout transaction.

use sqlx::PgPool;
use thiserror::Error;

use metra_core::cart::Cart;
use metra_core::{OrderId, UserId};

use super::RepositoryError;
use super::analytics::{self, Counter};
use crate::models::{Order, OrderDetails, OrderLine};

const ORDER_COLUMNS: &str = "id, user_id, first_name, last_name, email, address, shipping_address, \
     postal_code, city, paid, status, total_amount, created_at";

/// Reasons checkout can fail.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Not enough stock available for {0}")]
    InsufficientStock(String),

    #[error("A product in your cart is no longer available")]
    Unavailable,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

#[derive(sqlx::FromRow)]
struct LockedProduct {
    name: String,
    stock: i32,
    available: bool,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn a cart into an order.
    ///
    /// In one transaction: lock every product row, check and decrement its
    /// stock, insert the order with the cart's total, insert one item per
    /// cart line at the snapshotted price, and bump each product's purchase
    /// counter. Nothing is written if any line fails.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InsufficientStock` naming the first product
    /// that cannot be fulfilled, `CheckoutError::Unavailable` if a product
    /// was removed or disabled, or a database error.
    pub async fn place_order(
        &self,
        user_id: UserId,
        details: &OrderDetails,
        cart: &Cart,
    ) -> Result<OrderId, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Lock in id order so concurrent checkouts cannot deadlock.
        let mut lines = cart.lines().to_vec();
        lines.sort_by_key(|line| line.product_id.as_i32());

        let mut tx = self.pool.begin().await?;

        for line in &lines {
            let quantity = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            let product = sqlx::query_as::<_, LockedProduct>(
                "SELECT name, stock, available FROM store.product WHERE id = $1 FOR UPDATE",
            )
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CheckoutError::Unavailable)?;

            if !product.available {
                return Err(CheckoutError::Unavailable);
            }
            if product.stock < quantity {
                return Err(CheckoutError::InsufficientStock(product.name));
            }

            sqlx::query(
                "UPDATE store.product SET stock = stock - $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO store.order \
                 (user_id, first_name, last_name, email, address, shipping_address, \
                  postal_code, city, total_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.shipping_address)
        .bind(&details.postal_code)
        .bind(&details.city)
        .bind(cart.totals().total)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO store.order_item (order_id, product_id, price, quantity) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.price)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;

            analytics::bump(&mut *tx, line.product_id, Counter::Purchase).await?;
        }

        tx.commit().await?;

        tracing::info!(%order_id, %user_id, lines = lines.len(), "Order placed");
        Ok(order_id)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.order \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// An order, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.order WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lines of an order with product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT i.id, i.product_id, p.name AS product_name, p.slug AS product_slug, \
                    i.price, i.quantity \
             FROM store.order_item i \
             JOIN store.product p ON p.id = i.product_id \
             WHERE i.order_id = $1 \
             ORDER BY i.id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }
}
