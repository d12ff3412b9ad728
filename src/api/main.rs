use axum::{Router, response::Json, routing::get};
use event_catalog_api::middleware::{
    create_cors_layer, create_restricted_cors_layer, create_trace_layer, init_tracing,
};
use event_catalog_api::routes::{self, create_api_router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Application starting...");

    let app_state = routes::create_app_state_with_storage().await?;
    info!(
        "Storage backend: {}",
        if app_state.is_postgres() {
            "postgres"
        } else {
            "memory"
        }
    );

    let cors = match std::env::var("CORS_ALLOWED_ORIGINS") {
        Ok(origins) => {
            let origins: Vec<String> = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            info!("CORS restricted to {:?}", origins);
            create_restricted_cors_layer(&origins)
        }
        Err(_) => create_cors_layer(),
    };

    // Health checks + API routes nested under /api/v1
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/health", get(health_check))
        .nest("/api/v1", create_api_router(app_state.clone()))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(create_trace_layer())
                .layer(cors),
        );

    // Run server on configurable port (default 8081 for API)
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8081);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {} (port {})", addr, port);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "event-catalog-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
