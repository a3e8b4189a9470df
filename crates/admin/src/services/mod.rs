//! Business logic services for the admin API.
//!
//! # Services
//!
//! - `auth` - Staff token issuance and admin registration
//! - `uploads` - Update package storage on local disk

pub mod auth;
pub mod uploads;

pub use auth::{AuthError, StaffAuthService};
pub use uploads::{UploadStore, sanitize_file_name};
