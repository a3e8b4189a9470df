//! Product analytics formulas.
//!
//! Counters (`views`, `cart_additions`, `purchases`) are stored per product
//! per period; everything here is derived from them on read.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Trend, round_cents};

/// Default trailing window for sales analytics.
pub const DEFAULT_SALES_DAYS: i64 = 30;

/// Longest accepted sales window (ten years).
pub const MAX_SALES_DAYS: i64 = 3650;

/// Number of products in the "top products" ranking.
pub const TOP_PRODUCTS: usize = 5;

const CONVERSION_WEIGHT: Decimal = Decimal::from_parts(4, 0, 0, false, 1);
const VIEWS_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
const CART_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
/// A 20% conversion rate scores full marks.
const EXCELLENT_CONVERSION: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
/// 1000 views in a period scores full marks.
const EXCELLENT_VIEWS: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
const UPPER_BAND: Decimal = Decimal::from_parts(105, 0, 0, false, 2);
const LOWER_BAND: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// Validation failures for analytics counters and windows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("Purchases cannot exceed cart additions")]
    PurchasesExceedCartAdditions,
    #[error("days must be between 1 and {MAX_SALES_DAYS}")]
    InvalidWindow,
}

/// Reject negative counters and more purchases than cart additions.
///
/// # Errors
///
/// Returns the first rule the counters break.
pub const fn validate_counters(
    views: i64,
    cart_additions: i64,
    purchases: i64,
) -> Result<(), AnalyticsError> {
    if views < 0 {
        return Err(AnalyticsError::Negative("Views"));
    }
    if cart_additions < 0 {
        return Err(AnalyticsError::Negative("Cart additions"));
    }
    if purchases < 0 {
        return Err(AnalyticsError::Negative("Purchases"));
    }
    if purchases > cart_additions {
        return Err(AnalyticsError::PurchasesExceedCartAdditions);
    }
    Ok(())
}

/// `purchases / views × 100`, rounded to two places; zero without views.
#[must_use]
pub fn conversion_rate(views: i64, purchases: i64) -> Decimal {
    if views <= 0 {
        return Decimal::ZERO;
    }
    round_cents(Decimal::from(purchases) / Decimal::from(views) * Decimal::ONE_HUNDRED)
}

/// Compare a period's conversion rate with the one before it.
///
/// More than 5% relative improvement is increasing, more than 5% relative
/// decline is decreasing. No previous period means stable.
#[must_use]
pub fn trend(current: Decimal, previous: Option<Decimal>) -> Trend {
    let Some(previous) = previous else {
        return Trend::Stable;
    };
    if current > previous * UPPER_BAND {
        Trend::Increasing
    } else if current < previous * LOWER_BAND {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Weighted 0-100 score: 40% conversion, 30% views, 30% cart-add ratio.
///
/// Each sub-score is capped at 100 before weighting. Rounded to one place.
#[must_use]
pub fn performance_score(views: i64, cart_additions: i64, purchases: i64) -> Decimal {
    let conversion_score =
        (conversion_rate(views, purchases) / EXCELLENT_CONVERSION * Decimal::ONE_HUNDRED)
            .min(Decimal::ONE_HUNDRED);
    let views_score = (Decimal::from(views.max(0)) / EXCELLENT_VIEWS * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED);
    let cart_score = if views > 0 {
        let ratio = Decimal::from(cart_additions) / Decimal::from(views) * Decimal::ONE_HUNDRED;
        (ratio * Decimal::from(2)).min(Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    };

    (conversion_score * CONVERSION_WEIGHT + views_score * VIEWS_WEIGHT + cart_score * CART_WEIGHT)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// `total / count`, rounded to cents; zero when there are no orders.
#[must_use]
pub fn average_order_value(total_sales: Decimal, orders_count: i64) -> Decimal {
    if orders_count <= 0 {
        return Decimal::ZERO;
    }
    round_cents(total_sales / Decimal::from(orders_count))
}

/// Validate the `days` parameter of the sales endpoint.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidWindow`] outside `1..=3650`.
pub fn sales_window(days: Option<i64>) -> Result<i64, AnalyticsError> {
    let days = days.unwrap_or(DEFAULT_SALES_DAYS);
    if (1..=MAX_SALES_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(AnalyticsError::InvalidWindow)
    }
}

/// Label for a sales window, e.g. `"Last 30 days"`.
#[must_use]
pub fn period_label(days: i64) -> String {
    format!("Last {days} days")
}

/// Hours between opening and last update of a request, to one place.
#[must_use]
pub fn response_time_hours(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Decimal {
    let seconds = (updated_at - created_at).num_seconds().max(0);
    (Decimal::from(seconds) / Decimal::from(3600))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole days elapsed since `created_at`.
#[must_use]
pub fn days_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}
