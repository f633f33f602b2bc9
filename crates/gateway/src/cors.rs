//! CORS policy for the REST API.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tp_domain::config::CorsConfig;

const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Whether `origin` is allowed by the configured list. Entries ending in
/// `:*` accept any numeric port on that host.
pub fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|entry| match entry.strip_suffix('*') {
        Some(prefix) if prefix.ends_with(':') => origin
            .strip_prefix(prefix)
            .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        _ => entry == origin,
    })
}

/// A lone `"*"` allows every origin, without credentials.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\"; all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(METHODS)
            .allow_headers([header::CONTENT_TYPE]);
    }

    let allowed = cors.allowed_origins.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| origin_allowed(&allowed, o))
                .unwrap_or(false)
        }))
        .allow_methods(METHODS)
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
