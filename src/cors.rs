//! CORS Configuration for the Payment Relay
//!
//! The `/create-payment` endpoint is called from a browser frontend, so the
//! relay must answer preflight requests for that origin. Origins come from
//! the `ALLOWED_ORIGINS` configuration; when none are configured the layer
//! falls back to allowing any origin, which suits local development.
//!
//! The redirect and webhook endpoints are not browser-XHR surfaces (top-level
//! navigation and server-to-server respectively), so the policy only matters
//! for payment initiation.

use http::{header::HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Headers the frontend is allowed to send
pub const ALLOWED_HEADERS: [http::header::HeaderName; 2] =
    [http::header::CONTENT_TYPE, http::header::ACCEPT];

/// Methods the relay answers to from browsers
pub const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Default max age for preflight cache (1 hour)
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Build the CORS layer from the configured origin list
///
/// An empty list produces a permissive layer. A non-empty list restricts
/// browsers to exactly those origins; entries that are not valid header
/// values are logged and skipped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = parse_origins(allowed_origins);

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
        .max_age(Duration::from_secs(DEFAULT_MAX_AGE_SECS))
}

/// Convert configured origin strings to header values, dropping invalid ones
pub fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .map(|origin| origin.trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}
