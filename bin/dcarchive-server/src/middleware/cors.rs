use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Read-only API: `GET` from the configured origins, or from anywhere when
/// `DCARCHIVE_CORS_ORIGINS` is unset or holds nothing parseable.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::HEAD])
}
