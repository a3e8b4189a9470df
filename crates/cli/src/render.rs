//! Plain-text views of admin API reports: stat lines, tables and bar charts.
//!
//! Renderers return strings; printing is left to the caller.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::client::{ProductAnalytics, RequestSummary, SalesReport};

/// Widest bar drawn by [`bar_chart`].
pub const BAR_WIDTH: usize = 40;

const BAR: char = '█';

/// Horizontal bar chart, one row per `(label, value)`, scaled to the largest
/// value. Negative values draw as empty bars.
#[must_use]
pub fn bar_chart(rows: &[(String, Decimal)], width: usize) -> String {
    let max = rows
        .iter()
        .map(|(_, v)| *v)
        .max()
        .unwrap_or(Decimal::ZERO);
    let label_width = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (label, value) in rows {
        let len = if max > Decimal::ZERO && *value > Decimal::ZERO {
            (*value / max * Decimal::from(width))
                .round()
                .to_usize()
                .unwrap_or(0)
                .max(1)
        } else {
            0
        };
        let bar: String = std::iter::repeat_n(BAR, len).collect();
        let _ = writeln!(out, "{label:<label_width$}  {bar} {value}");
    }
    out
}

/// Aligned table with a header rule. Cells are left-aligned.
#[must_use]
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", pad_row(headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", pad_row(&cells, &widths));
    }
    out
}

fn pad_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

/// Sales stats, the top-products chart and the revenue-by-category chart.
#[must_use]
pub fn overview(report: &SalesReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dashboard Overview ({})", report.period);
    let _ = writeln!(out);
    let _ = writeln!(out, "Total Sales   ${}", report.total_sales);
    let _ = writeln!(out, "Orders        {}", report.orders_count);
    let _ = writeln!(out, "Avg Order     ${}", report.average_order_value);
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Selling Products");
    if report.top_products.is_empty() {
        let _ = writeln!(out, "  (no sales in this period)");
    } else {
        let rows: Vec<(String, Decimal)> = report
            .top_products
            .iter()
            .map(|p| (p.name.clone(), Decimal::from(p.sales)))
            .collect();
        out.push_str(&bar_chart(&rows, BAR_WIDTH));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Sales by Category");
    let total: Decimal = report.sales_by_category.values().copied().sum();
    let rows: Vec<(String, Decimal)> = report
        .sales_by_category
        .iter()
        .map(|(name, revenue)| (format!("{name} ({})", share(*revenue, total)), *revenue))
        .collect();
    if rows.is_empty() {
        let _ = writeln!(out, "  (no categories)");
    } else {
        out.push_str(&bar_chart(&rows, BAR_WIDTH));
    }
    out
}

/// Percentage of `total`, one decimal place.
fn share(part: Decimal, total: Decimal) -> String {
    if total.is_zero() {
        return "0.0%".to_owned();
    }
    format!("{:.1}%", part / total * Decimal::ONE_HUNDRED)
}

/// Customer requests, newest first as returned by the API.
#[must_use]
pub fn requests_table(requests: &[RequestSummary]) -> String {
    let rows: Vec<Vec<String>> = requests
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.username.clone(),
                r.request_type.to_string(),
                r.status.to_string(),
                r.subject.clone(),
                r.created_at.format("%Y-%m-%d").to_string(),
                r.response_time.map_or_else(String::new, |h| format!("{h}h")),
            ]
        })
        .collect();
    table(
        &["ID", "Customer", "Type", "Status", "Subject", "Date", "Response"],
        &rows,
    )
}

/// Product analytics with conversion, trend and performance score.
#[must_use]
pub fn analytics_table(analytics: &[ProductAnalytics]) -> String {
    let rows: Vec<Vec<String>> = analytics
        .iter()
        .map(|a| {
            vec![
                a.product_name.clone(),
                a.category.clone(),
                a.views.to_string(),
                a.cart_additions.to_string(),
                a.purchases.to_string(),
                format!("{}%", a.conversion_rate),
                a.trend.to_string(),
                a.performance_score.to_string(),
            ]
        })
        .collect();
    table(
        &[
            "Product",
            "Category",
            "Views",
            "Cart",
            "Purchases",
            "Conversion",
            "Trend",
            "Score",
        ],
        &rows,
    )
}
