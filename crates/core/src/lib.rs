//! Metra Core - Shared types and business rules.
//!
//! This crate is used by every Metra component:
//! - `storefront` - Public catalog, cart, and checkout site
//! - `admin` - Bearer-token REST API for the analytics dashboard
//! - `cli` - Migrations, admin management, and the dashboard client
//!
//! # Architecture
//!
//! The core crate holds types and pure functions only - no I/O, no database
//! access, no HTTP clients. Cart pricing, search normalization, and the
//! analytics formulas live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, and status enums
//! - [`cart`] - Session cart with promo codes and a single totals formula
//! - [`search`] - Query tokenization, popular-search log, and suggestions
//! - [`analytics`] - Conversion rate, trend, performance score, sales averages
//! - [`password`] - Argon2 password hashing shared by storefront and admin

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod password;
pub mod search;
pub mod types;

pub use types::*;
