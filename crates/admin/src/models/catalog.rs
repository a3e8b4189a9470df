//! Categories and products as managed from the dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use metra_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
}

/// Body of `POST`/`PUT /api/dashboard/categories/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CategoryPayload {
    /// Trim fields and derive a missing slug from the name.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for a blank name or slug.
    pub fn normalize(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("Name is required.".to_string());
        }
        let slug = resolve_slug(self.slug.as_deref(), &self.name)?;
        self.slug = Some(slug);
        Ok(self)
    }

    /// The slug after [`Self::normalize`].
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }
}

/// Body of `PATCH /api/dashboard/categories/{id}/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
}

impl CategoryPatch {
    /// Overlay this patch on an existing category.
    #[must_use]
    pub fn apply(self, current: Category) -> CategoryPayload {
        CategoryPayload {
            name: self.name.unwrap_or(current.name),
            slug: Some(self.slug.unwrap_or(current.slug)),
            description: self.description.unwrap_or(current.description),
            image: self.image.unwrap_or(current.image),
        }
    }
}

/// A product with its category name and number of order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category: CategoryId,
    pub category_name: String,
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
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub sales_count: i64,
}

/// Body of `POST`/`PUT /api/dashboard/products/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub category: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub featured: bool,
}

const fn default_true() -> bool {
    true
}

impl ProductPayload {
    /// Check the pricing and stock rules and derive a missing slug.
    ///
    /// # Errors
    ///
    /// Returns the first broken rule as a user-facing message.
    pub fn normalize(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("Name is required.".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("Price must be greater than zero".to_string());
        }
        if self.stock < 0 {
            return Err("Stock cannot be negative".to_string());
        }
        if let Some(sale) = self.sale_price {
            if sale <= Decimal::ZERO {
                return Err("Sale price must be greater than zero".to_string());
            }
            if sale >= self.price {
                return Err("Sale price must be lower than the regular price".to_string());
            }
        }
        let slug = resolve_slug(self.slug.as_deref(), &self.name)?;
        self.slug = Some(slug);
        Ok(self)
    }

    /// The slug after [`Self::normalize`].
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }
}

/// Body of `PATCH /api/dashboard/products/{id}/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub category: Option<CategoryId>,
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_price: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    /// Overlay this patch on an existing product.
    #[must_use]
    pub fn apply(self, current: Product) -> ProductPayload {
        ProductPayload {
            category: self.category.unwrap_or(current.category),
            name: self.name.unwrap_or(current.name),
            slug: Some(self.slug.unwrap_or(current.slug)),
            image: self.image.unwrap_or(current.image),
            description: self.description.unwrap_or(current.description),
            short_description: self.short_description.unwrap_or(current.short_description),
            price: self.price.unwrap_or(current.price),
            sale_price: self.sale_price.unwrap_or(current.sale_price),
            stock: self.stock.unwrap_or(current.stock),
            available: self.available.unwrap_or(current.available),
            featured: self.featured.unwrap_or(current.featured),
        }
    }
}

/// Distinguish an explicit `null` (clear the field) from an absent key.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, String> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => slugify(given),
        None => slugify(name),
    };
    if slug.is_empty() {
        return Err("Slug must contain letters or digits.".to_string());
    }
    Ok(slug)
}

/// Lower-case ASCII letters and digits joined by single hyphens.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (matches!(c, '_' | '-') || c.is_whitespace())
            && !slug.is_empty()
            && !slug.ends_with('-')
        {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> ProductPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Red Wool Socks"), "red-wool-socks");
        assert_eq!(slugify("  Tea & Coffee!  "), "tea-coffee");
        assert_eq!(slugify("already-a_slug"), "already-a-slug");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_product_payload_defaults_and_slug() {
        let product = payload(serde_json::json!({
            "category": 1, "name": "Wool Socks", "price": "12.50", "stock": 3
        }))
        .normalize()
        .unwrap();
        assert_eq!(product.slug(), "wool-socks");
        assert!(product.available);
        assert!(!product.featured);
        assert_eq!(product.price, Decimal::new(1250, 2));
    }

    #[test]
    fn test_product_payload_rules() {
        let base = serde_json::json!({ "category": 1, "name": "Mug", "price": 10, "stock": 1 });

        let mut zero_price = base.clone();
        zero_price["price"] = serde_json::json!(0);
        assert_eq!(
            payload(zero_price).normalize().unwrap_err(),
            "Price must be greater than zero"
        );

        let mut negative_stock = base.clone();
        negative_stock["stock"] = serde_json::json!(-1);
        assert_eq!(
            payload(negative_stock).normalize().unwrap_err(),
            "Stock cannot be negative"
        );

        let mut high_sale = base;
        high_sale["sale_price"] = serde_json::json!("10.00");
        assert!(payload(high_sale).normalize().is_err());
    }

    #[test]
    fn test_category_patch_keeps_unset_fields() {
        let current = Category {
            id: CategoryId::new(4),
            name: "Kitchen".to_string(),
            slug: "kitchen".to_string(),
            description: "Pots".to_string(),
            image: Some("categories/kitchen.png".to_string()),
        };
        let patch: CategoryPatch =
            serde_json::from_value(serde_json::json!({ "description": "Pans", "image": null }))
                .unwrap();

        let merged = patch.apply(current);
        assert_eq!(merged.name, "Kitchen");
        assert_eq!(merged.slug(), "kitchen");
        assert_eq!(merged.description, "Pans");
        assert_eq!(merged.image, None);
    }
}
