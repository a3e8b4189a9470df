//! Product analytics rows and their computed metrics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use metra_core::analytics::{self, AnalyticsError};
use metra_core::{AnalyticsId, ProductId, Trend};

/// A stored analytics row joined with its product, plus the counters of the
/// row immediately before it for the same product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsRow {
    pub id: AnalyticsId,
    pub product: ProductId,
    pub product_name: String,
    pub category: String,
    pub views: i64,
    pub cart_additions: i64,
    pub purchases: i64,
    pub last_updated: DateTime<Utc>,
    pub previous_views: Option<i64>,
    pub previous_purchases: Option<i64>,
}

/// JSON view of an analytics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsView {
    pub id: AnalyticsId,
    pub product: ProductId,
    pub product_name: String,
    pub category: String,
    pub views: i64,
    pub cart_additions: i64,
    pub purchases: i64,
    pub conversion_rate: Decimal,
    pub trend: Trend,
    pub performance_score: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl From<AnalyticsRow> for AnalyticsView {
    fn from(row: AnalyticsRow) -> Self {
        let conversion_rate = analytics::conversion_rate(row.views, row.purchases);
        let previous = row
            .previous_views
            .zip(row.previous_purchases)
            .map(|(views, purchases)| analytics::conversion_rate(views, purchases));

        Self {
            id: row.id,
            product: row.product,
            product_name: row.product_name,
            category: row.category,
            views: row.views,
            cart_additions: row.cart_additions,
            purchases: row.purchases,
            conversion_rate,
            trend: analytics::trend(conversion_rate, previous),
            performance_score: analytics::performance_score(
                row.views,
                row.cart_additions,
                row.purchases,
            ),
            last_updated: row.last_updated,
        }
    }
}

/// Body of `POST`/`PUT /api/dashboard/analytics/`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnalyticsPayload {
    pub product: ProductId,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub cart_additions: i64,
    #[serde(default)]
    pub purchases: i64,
}

impl AnalyticsPayload {
    /// # Errors
    ///
    /// Returns the counter rule the payload breaks.
    pub const fn validate(&self) -> Result<(), AnalyticsError> {
        analytics::validate_counters(self.views, self.cart_additions, self.purchases)
    }
}

/// Body of `PATCH /api/dashboard/analytics/{id}/`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnalyticsPatch {
    pub product: Option<ProductId>,
    pub views: Option<i64>,
    pub cart_additions: Option<i64>,
    pub purchases: Option<i64>,
}

impl AnalyticsPatch {
    #[must_use]
    pub fn apply(self, current: &AnalyticsView) -> AnalyticsPayload {
        AnalyticsPayload {
            product: self.product.unwrap_or(current.product),
            views: self.views.unwrap_or(current.views),
            cart_additions: self.cart_additions.unwrap_or(current.cart_additions),
            purchases: self.purchases.unwrap_or(current.purchases),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(views: i64, cart_additions: i64, purchases: i64) -> AnalyticsRow {
        AnalyticsRow {
            id: AnalyticsId::new(1),
            product: ProductId::new(7),
            product_name: "Wool Socks".to_string(),
            category: "Clothing".to_string(),
            views,
            cart_additions,
            purchases,
            last_updated: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            previous_views: None,
            previous_purchases: None,
        }
    }

    #[test]
    fn test_view_computes_metrics() {
        let view = AnalyticsView::from(row(200, 40, 10));
        assert_eq!(view.conversion_rate, Decimal::new(50, 1));
        assert_eq!(view.trend, Trend::Stable);
        // 0.4 * 25 + 0.3 * 20 + 0.3 * 40
        assert_eq!(view.performance_score, Decimal::new(280, 1));
    }

    #[test]
    fn test_view_trend_uses_previous_row() {
        let mut current = row(100, 20, 10);
        current.previous_views = Some(100);
        current.previous_purchases = Some(5);
        assert_eq!(AnalyticsView::from(current).trend, Trend::Increasing);

        let mut current = row(100, 20, 4);
        current.previous_views = Some(100);
        current.previous_purchases = Some(5);
        assert_eq!(AnalyticsView::from(current).trend, Trend::Decreasing);
    }

    #[test]
    fn test_payload_validation() {
        let payload: AnalyticsPayload = serde_json::from_value(serde_json::json!({
            "product": 7, "views": 10, "cart_additions": 2, "purchases": 3
        }))
        .unwrap();
        assert_eq!(
            payload.validate(),
            Err(AnalyticsError::PurchasesExceedCartAdditions)
        );
    }

    #[test]
    fn test_patch_overlays_counters() {
        let current = AnalyticsView::from(row(200, 40, 10));
        let patch = AnalyticsPatch {
            views: Some(250),
            ..AnalyticsPatch::default()
        };
        let merged = patch.apply(&current);
        assert_eq!(merged.views, 250);
        assert_eq!(merged.purchases, 10);
        assert_eq!(merged.product, ProductId::new(7));
    }
}
