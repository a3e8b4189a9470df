//! Orders as seen from the dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use metra_core::analytics::days_since;
use metra_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order joined with its customer and the sum of its lines.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub paid: bool,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// JSON view of an order.
///
/// `status` is the payment-derived label shown in the dashboard;
/// `fulfillment_status` is the stored lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user: Option<UserId>,
    pub user_email: String,
    pub user_name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub paid: bool,
    pub order_items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub total_cost: Decimal,
    pub status: &'static str,
    pub fulfillment_status: OrderStatus,
    pub days_since_order: i64,
}

impl OrderView {
    #[must_use]
    pub fn new(row: OrderRow, order_items: Vec<OrderItem>, now: DateTime<Utc>) -> Self {
        let user_name = display_name(&row);
        let user_email = row.user_email.clone().unwrap_or_else(|| row.email.clone());

        Self {
            id: row.id,
            user: row.user_id,
            user_email,
            user_name,
            created: row.created_at,
            updated: row.updated_at,
            paid: row.paid,
            order_items,
            total_amount: row.total_amount,
            total_cost: row.total_cost,
            status: payment_label(row.paid),
            fulfillment_status: row.status,
            days_since_order: days_since(row.created_at, now),
        }
    }
}

/// "Completed" once paid, otherwise "Pending Payment".
#[must_use]
pub const fn payment_label(paid: bool) -> &'static str {
    if paid { "Completed" } else { "Pending Payment" }
}

/// The account's full name, its username when the name is blank, or the
/// name on the order when the account is gone.
fn display_name(row: &OrderRow) -> String {
    let Some(username) = &row.username else {
        return format!("{} {}", row.first_name, row.last_name).trim().to_string();
    };
    let full = format!(
        "{} {}",
        row.user_first_name.as_deref().unwrap_or_default(),
        row.user_last_name.as_deref().unwrap_or_default()
    );
    let full = full.trim();
    if full.is_empty() {
        username.clone()
    } else {
        full.to_string()
    }
}

/// Body of `PATCH /api/dashboard/orders/{id}/`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub paid: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn row() -> OrderRow {
        OrderRow {
            id: OrderId::new(12),
            user_id: Some(UserId::new(3)),
            username: Some("ada".to_string()),
            user_first_name: Some("Ada".to_string()),
            user_last_name: Some("Lovelace".to_string()),
            user_email: Some("ada@example.com".to_string()),
            first_name: "A.".to_string(),
            last_name: "L.".to_string(),
            email: "shipping@example.com".to_string(),
            paid: false,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(2150, 2),
            total_cost: Decimal::new(2000, 2),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_view_uses_account_details() {
        let created = row().created_at;
        let view = OrderView::new(row(), Vec::new(), created + Duration::hours(73));
        assert_eq!(view.user_name, "Ada Lovelace");
        assert_eq!(view.user_email, "ada@example.com");
        assert_eq!(view.status, "Pending Payment");
        assert_eq!(view.days_since_order, 3);
    }

    #[test]
    fn test_view_falls_back_to_username_then_order() {
        let mut blank = row();
        blank.user_first_name = Some(String::new());
        blank.user_last_name = None;
        blank.paid = true;
        let view = OrderView::new(blank, Vec::new(), Utc::now());
        assert_eq!(view.user_name, "ada");
        assert_eq!(view.status, "Completed");

        let mut deleted = row();
        deleted.user_id = None;
        deleted.username = None;
        deleted.user_email = None;
        let view = OrderView::new(deleted, Vec::new(), Utc::now());
        assert_eq!(view.user_name, "A. L.");
        assert_eq!(view.user_email, "shipping@example.com");
    }
}
