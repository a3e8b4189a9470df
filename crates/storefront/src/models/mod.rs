//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and are read with runtime-checked
//! `query_as` calls in [`crate::db`].

pub mod catalog;
pub mod order;
pub mod review;
pub mod session;
pub mod user;

pub use catalog::{Category, Product};
pub use order::{Order, OrderDetails, OrderLine};
pub use review::Review;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
