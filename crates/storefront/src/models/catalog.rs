//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use metra_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
}

impl Category {
    #[must_use]
    pub fn url(&self) -> String {
        format!("/category/{}/", self.slug)
    }
}

/// A product joined with its category's name and slug.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_slug: String,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: String,
    pub short_description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub available: bool,
    pub featured: bool,
    pub average_rating: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn url(&self) -> String {
        format!("/product/{}/", self.slug)
    }

    /// A sale price is set and below the list price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale < self.price)
    }

    /// Whole-percent discount of the sale price, or 0.
    #[must_use]
    pub fn discount_percentage(&self) -> i64 {
        match self.sale_price {
            Some(sale) if sale < self.price && self.price > Decimal::ZERO => {
                (Decimal::ONE_HUNDRED - sale * Decimal::ONE_HUNDRED / self.price)
                    .trunc()
                    .to_i64()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Average rating rounded to whole stars, for display.
    #[must_use]
    pub fn rating_stars(&self) -> u8 {
        self.average_rating
            .round()
            .to_u8()
            .map_or(0, |stars| stars.min(5))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: i64, sale: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            category_name: "Kitchen".to_string(),
            category_slug: "kitchen".to_string(),
            name: "Teapot".to_string(),
            slug: "teapot".to_string(),
            image: None,
            description: String::new(),
            short_description: String::new(),
            price: Decimal::new(price, 2),
            sale_price: sale.map(|s| Decimal::new(s, 2)),
            stock: 3,
            available: true,
            featured: false,
            average_rating: Decimal::new(46, 1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_discount_percentage_truncates() {
        assert_eq!(product(3_000, Some(2_000)).discount_percentage(), 33);
        assert_eq!(product(3_000, None).discount_percentage(), 0);
        assert!(!product(3_000, None).is_on_sale());
    }

    #[test]
    fn test_urls_and_stars() {
        let p = product(1_000, None);
        assert_eq!(p.url(), "/product/teapot/");
        assert_eq!(p.rating_stars(), 5);
    }
}
