//! Rate limiting for token issuance using governor and `tower_governor`.

use std::sync::Arc;

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for `POST /api/token/`: ~10 attempts per minute per IP.
///
/// Clients are keyed by `X-Forwarded-For`, `X-Real-Ip` or `Forwarded`,
/// falling back to the peer address.
///
/// # Panics
///
/// Never; `per_second(6)` and `burst_size(5)` are valid settings.
#[must_use]
pub fn token_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
