//! API routes module - organizes all route handlers.
//!
//! Project-scoped collections (servers, schemas, messages, apps) are merged
//! into the /projects router; entity-scoped routes get their own prefix.

pub mod app_state;
pub mod apps;
pub mod auth;
pub mod auth_context;
pub mod error;
pub mod messages;
pub mod openapi;
pub mod projects;
pub mod schemas;
pub mod servers;

use axum::Router;
pub use app_state::AppState;
pub use error::ApiError;

/// Create the main API router combining all route modules.
///
/// State is applied by callers (`.with_state(app_state)`), so tests and the
/// binary can share one construction path.
pub fn create_api_router(_app_state: AppState) -> Router<AppState> {
    let project_routes = projects::projects_router()
        .merge(servers::project_servers_router())
        .merge(schemas::project_schemas_router())
        .merge(messages::project_messages_router())
        .merge(apps::project_apps_router());

    Router::new()
        .nest("/projects", project_routes)
        .nest("/servers", servers::servers_router())
        .nest("/schemas", schemas::schemas_router())
        .nest("/apps", apps::apps_router())
        .nest("/auth", auth::auth_router())
        // OpenAPI documentation endpoints
        .merge(openapi::openapi_router())
}

/// Create the application state backed by the in-memory store.
///
/// Note: For PostgreSQL storage, call `init_storage()` on the returned state.
pub fn create_app_state() -> Result<AppState, crate::services::JwtError> {
    Ok(AppState::new(crate::services::JwtService::from_env()?))
}

/// Create the application state with storage initialization (async).
///
/// This is the preferred method for production use.
pub async fn create_app_state_with_storage() -> anyhow::Result<AppState> {
    let mut state = create_app_state()?;
    state.init_storage().await?;
    Ok(state)
}
