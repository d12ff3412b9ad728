//! CORS middleware configuration.

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Create a CORS layer with permissive settings.
///
/// This allows all origins, methods, and headers.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Create a CORS layer restricted to the given origins.
///
/// Origins that are not valid header values are skipped with a warning.
/// Methods and headers stay permissive.
pub fn create_restricted_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}
