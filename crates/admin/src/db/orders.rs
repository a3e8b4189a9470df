//! Order management from the dashboard.

use sqlx::PgPool;

use metra_core::{OrderId, OrderStatus};

use super::{RepositoryError, order_by, search_clause, search_patterns};
use crate::models::{OrderItem, OrderRow};

const ORDER_ORDERING: &[(&str, &str)] = &[
    ("created", "o.created_at"),
    ("updated", "o.updated_at"),
    ("paid", "o.paid"),
];

const ORDER_SELECT: &str = "\
    SELECT o.id, o.user_id, u.username, u.first_name AS user_first_name, \
           u.last_name AS user_last_name, u.email AS user_email, \
           o.first_name, o.last_name, o.email, o.paid, o.status, o.total_amount, \
           COALESCE((SELECT SUM(i.price * i.quantity) FROM store.order_item i \
                     WHERE i.order_id = o.id), 0) AS total_cost, \
           o.created_at, o.updated_at \
    FROM store.order o \
    LEFT JOIN store.user u ON u.id = o.user_id";

/// Payment filter of the order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidFilter {
    Paid,
    Unpaid,
}

impl PaidFilter {
    /// `paid` or `unpaid`; anything else means no filter.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            Some("paid") => Some(Self::Paid),
            Some("unpaid") => Some(Self::Unpaid),
            _ => None,
        }
    }

    const fn as_bool(self) -> bool {
        matches!(self, Self::Paid)
    }
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

    /// Orders matching `search` over ID, username and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        paid: Option<PaidFilter>,
        search: Option<&str>,
        ordering: Option<&str>,
    ) -> Result<Vec<OrderRow>, RepositoryError> {
        let sql = format!(
            "{ORDER_SELECT} WHERE ($1::bool IS NULL OR o.paid = $1) AND {} ORDER BY {}, o.id DESC",
            search_clause(
                "$2",
                &["o.id::text", "u.username", "u.email", "o.email"]
            ),
            order_by(ordering, ORDER_ORDERING, "o.created_at DESC"),
        );
        let orders = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(paid.map(PaidFilter::as_bool))
            .bind(search_patterns(search))
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn get(&self, id: OrderId) -> Result<OrderRow, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Lines of the given orders, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<(OrderId, OrderItem)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Line {
            order_id: OrderId,
            #[sqlx(flatten)]
            item: OrderItem,
        }

        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let lines = sqlx::query_as::<_, Line>(
            "SELECT i.order_id, i.id, i.product_id AS product, p.name AS product_name, \
                    i.price, i.quantity \
             FROM store.order_item i \
             JOIN store.product p ON p.id = i.product_id \
             WHERE i.order_id = ANY($1) \
             ORDER BY i.id",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(lines.into_iter().map(|l| (l.order_id, l.item)).collect())
    }

    /// Change fulfillment status and/or payment flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn update(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        paid: Option<bool>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.order SET status = COALESCE($2, status), paid = COALESCE($3, paid), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(paid)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(%id, ?status, ?paid, "Order updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn mark_as_paid(&self, id: OrderId) -> Result<(), RepositoryError> {
        self.update(id, None, Some(true)).await
    }

    /// Delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
