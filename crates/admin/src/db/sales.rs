//! Sales aggregates over paid orders in a trailing window.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use metra_core::analytics::{TOP_PRODUCTS, average_order_value, period_label};

use super::RepositoryError;
use crate::models::{SalesReport, TopProduct};

const WINDOW_ORDERS: &str = "\
    SELECT id FROM store.order \
    WHERE paid AND created_at >= NOW() - make_interval(days => $1::int)";

/// Repository for sales analytics.
pub struct SalesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesRepository<'a> {
    /// Create a new sales repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the report for the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if `days` does not fit the database.
    pub async fn report(&self, days: i64) -> Result<SalesReport, RepositoryError> {
        let days = i32::try_from(days)
            .map_err(|_| RepositoryError::DataCorruption(format!("window of {days} days")))?;

        let (total_sales, orders_count) = sqlx::query_as::<_, (Decimal, i64)>(&format!(
            "WITH window_orders AS ({WINDOW_ORDERS}) \
             SELECT COALESCE((SELECT SUM(i.price * i.quantity) FROM store.order_item i \
                              WHERE i.order_id IN (SELECT id FROM window_orders)), 0), \
                    (SELECT COUNT(*) FROM window_orders)"
        ))
        .bind(days)
        .fetch_one(self.pool)
        .await?;

        let by_category = sqlx::query_as::<_, (String, Decimal)>(&format!(
            "WITH window_orders AS ({WINDOW_ORDERS}) \
             SELECT c.name, COALESCE(SUM(i.price * i.quantity), 0) \
             FROM store.category c \
             LEFT JOIN store.product p ON p.category_id = c.id \
             LEFT JOIN store.order_item i \
                 ON i.product_id = p.id AND i.order_id IN (SELECT id FROM window_orders) \
             GROUP BY c.id, c.name"
        ))
        .bind(days)
        .fetch_all(self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(&format!(
            "WITH window_orders AS ({WINDOW_ORDERS}) \
             SELECT p.name, COUNT(i.id) AS sales, SUM(i.price * i.quantity) AS revenue \
             FROM store.order_item i \
             JOIN store.product p ON p.id = i.product_id \
             WHERE i.order_id IN (SELECT id FROM window_orders) \
             GROUP BY p.id, p.name \
             ORDER BY revenue DESC, p.name \
             LIMIT $2"
        ))
        .bind(days)
        .bind(i64::try_from(TOP_PRODUCTS).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        Ok(assemble(
            i64::from(days),
            total_sales,
            orders_count,
            by_category,
            top_products,
        ))
    }
}

/// Combine the aggregates into a report.
///
/// Categories sharing a name have their revenue summed.
fn assemble(
    days: i64,
    total_sales: Decimal,
    orders_count: i64,
    by_category: Vec<(String, Decimal)>,
    top_products: Vec<TopProduct>,
) -> SalesReport {
    let mut sales_by_category = BTreeMap::new();
    for (name, revenue) in by_category {
        *sales_by_category.entry(name).or_insert(Decimal::ZERO) += revenue;
    }

    SalesReport {
        total_sales,
        orders_count,
        average_order_value: average_order_value(total_sales, orders_count),
        period: period_label(days),
        sales_by_category,
        top_products,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_empty_window() {
        let report = assemble(
            7,
            Decimal::ZERO,
            0,
            vec![("Kitchen".to_string(), Decimal::ZERO)],
            Vec::new(),
        );
        assert_eq!(report.period, "Last 7 days");
        assert_eq!(report.average_order_value, Decimal::ZERO);
        assert_eq!(report.sales_by_category["Kitchen"], Decimal::ZERO);
        assert!(report.top_products.is_empty());
    }

    #[test]
    fn test_assemble_averages_and_merges_categories() {
        let report = assemble(
            30,
            Decimal::new(10000, 2),
            3,
            vec![
                ("Books".to_string(), Decimal::new(4000, 2)),
                ("Books".to_string(), Decimal::new(1000, 2)),
                ("Toys".to_string(), Decimal::new(5000, 2)),
            ],
            Vec::new(),
        );
        assert_eq!(report.average_order_value, Decimal::new(3333, 2));
        assert_eq!(report.sales_by_category["Books"], Decimal::new(5000, 2));
        assert_eq!(report.sales_by_category.len(), 2);
    }
}
