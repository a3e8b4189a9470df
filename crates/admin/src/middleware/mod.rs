//! HTTP middleware for the admin API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting on token issuance (governor)
//!
//! Authentication is per handler through the [`RequireStaff`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireStaff, bearer_token};
pub use rate_limit::token_rate_limiter;
pub use request_id::request_id_middleware;
