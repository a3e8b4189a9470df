//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use metra_core::{Email, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub shipping_address: String,
    pub postal_code: String,
    pub city: String,
    pub paid: bool,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One line of an order, joined with the product name and slug.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderLine {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Shipping and contact details entered at checkout.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    pub shipping_address: String,
    pub postal_code: String,
    pub city: String,
}
