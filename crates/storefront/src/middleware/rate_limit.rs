//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `search_rate_limiter`: live search API (~60/min)
//! - `auth_rate_limiter`: login and signup (~10/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers consulted in order before the socket peer address.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Keys requests by client IP: the first parseable proxy header, else the
/// TCP peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

/// First client IP found in the proxy headers. `X-Forwarded-For` contributes
/// its leftmost entry.
#[must_use]
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip_from_headers(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for the live search API: ~60 requests per minute per IP.
///
/// # Panics
///
/// Never; `per_second(1)` and `burst_size(60)` are valid settings.
#[must_use]
pub fn search_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1) // One token back per second
        .burst_size(60)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(60) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for login and signup: ~10 requests per minute per IP.
///
/// # Panics
///
/// Never; `per_second(6)` and `burst_size(5)` are valid settings.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_cloudflare_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(
            client_ip_from_headers(&headers),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn test_forwarded_for_uses_leftmost() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip_from_headers(&headers),
            Some("198.51.100.7".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::new(());
        let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "192.0.2.4".parse::<IpAddr>().unwrap()
        );

        let bare = Request::new(());
        assert!(ClientIpKeyExtractor.extract(&bare).is_err());
    }
}
