//! Observability middleware.
//!
//! Installs the global tracing subscriber and provides the HTTP trace layer.

use std::env;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing.
///
/// RUST_LOG controls the level (default: info). LOG_FORMAT=json switches to
/// structured JSON lines; anything else keeps the plain formatter. Output goes
/// to stderr without ANSI colours.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    // try_init so repeated calls (tests) do not panic
    let installed = if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        info!(
            "Tracing initialized ({} format)",
            if json { "json" } else { "text" }
        );
    }
}

/// Request/response tracing for every HTTP call
pub fn create_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
