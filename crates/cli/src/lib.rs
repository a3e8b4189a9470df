//! Metra dashboard client.
//!
//! A terminal rendition of the admin dashboard: an HTTP client for the
//! admin REST API and plain-text renderers for its reports.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod render;

pub use client::{ApiClient, ClientError};
