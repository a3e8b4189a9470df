//! Domain models for the admin API.
//!
//! Row types derive `sqlx::FromRow` and `Serialize`; they double as the JSON
//! bodies returned by [`crate::routes::api`]. Write payloads derive
//! `Deserialize` and carry their own validation.

pub mod analytics;
pub mod catalog;
pub mod order;
pub mod request;
pub mod sales;
pub mod update;
pub mod user;

pub use analytics::{AnalyticsPatch, AnalyticsPayload, AnalyticsRow, AnalyticsView};
pub use catalog::{
    Category, CategoryPatch, CategoryPayload, Product, ProductPatch, ProductPayload, slugify,
};
pub use order::{OrderItem, OrderPatch, OrderRow, OrderView};
pub use request::{CustomerRequest, CustomerRequestView, RequestPatch, RequestPayload};
pub use sales::{SalesReport, TopProduct};
pub use update::{NewUpdate, Update};
pub use user::{StaffUser, UserSummary};
