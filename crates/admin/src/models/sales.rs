//! Sales analytics report.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales over a trailing window of paid orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_sales: Decimal,
    pub orders_count: i64,
    pub average_order_value: Decimal,
    pub period: String,
    /// Every category, including those without sales.
    pub sales_by_category: BTreeMap<String, Decimal>,
    pub top_products: Vec<TopProduct>,
}

/// A best-selling product. `sales` counts order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopProduct {
    pub name: String,
    pub sales: i64,
    pub revenue: Decimal,
}
