//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Shopper registration and password login

pub mod auth;
