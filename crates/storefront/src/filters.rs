//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

use metra_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as dollars.
///
/// Usage in templates: `{{ product.price|money }}` renders `$12.50`.
/// Values that are not decimals pass through unchanged.
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw
        .parse::<Decimal>()
        .map_or(raw, |amount| Price::new(amount).to_string()))
}

/// Renders a 0-5 rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let filled = value.to_string().parse::<usize>().unwrap_or(0).min(5);
    Ok(format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)))
}
