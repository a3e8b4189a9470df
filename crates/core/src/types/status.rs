//! Status and classification enums.
//!
//! Each enum maps to a PostgreSQL enum type (behind the `postgres` feature)
//! and serializes in `snake_case` for the JSON API.

use serde::{Deserialize, Serialize};

/// Generates `as_str`, `Display`, and `FromStr` for a unit-only enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/database representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

/// Kind of customer request raised with the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dashboard.request_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Support,
    Return,
    Inquiry,
    Complaint,
}

string_enum!(RequestType {
    Support => "support",
    Return => "return",
    Inquiry => "inquiry",
    Complaint => "complaint",
});

/// Processing state of a customer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dashboard.request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

string_enum!(RequestStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Category of an uploaded update package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dashboard.update_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Product,
    System,
    Security,
}

string_enum!(UpdateType {
    Product => "product",
    System => "system",
    Security => "security",
});

/// Direction of a product's conversion rate between analytics periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

string_enum!(Trend {
    Increasing => "increasing",
    Decreasing => "decreasing",
    Stable => "stable",
});
