//! App routes: creation, send/receive wiring and the usage matrix.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::projects::require_project;
use crate::models::{
    App, AppResourceMessage, AppUsageMatrix, Direction, NewApp, NewAppResourceMessage,
};
use crate::services::NameRule;
use crate::services::input_contracts::check_token;
use crate::services::usage_service::usage_matrix;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConnectionRequest {
    pub resource_id: Uuid,
    pub message_id: Uuid,
    /// "sends" or "receives"
    pub direction: String,
}

pub fn project_apps_router() -> Router<AppState> {
    Router::new().route("/{project_id}/apps", get(list_apps).post(create_app))
}

pub fn apps_router() -> Router<AppState> {
    Router::new()
        .route("/{app_id}", get(get_app))
        .route("/{app_id}/usage", get(get_app_usage))
        .route("/{app_id}/connections", post(create_connection))
}

async fn require_app(state: &AppState, app_id: Uuid) -> Result<App, ApiError> {
    state
        .storage
        .get_app(app_id)
        .await?
        .ok_or_else(|| ApiError::not_found("App not found"))
}

/// POST /projects/{project_id}/apps
#[utoipa::path(
    post,
    path = "/projects/{project_id}/apps",
    tag = "Apps",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateAppRequest,
    responses(
        (status = 201, description = "App created", body = App),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "App name already in use in the project"),
        (status = 422, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_app(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<App>), ApiError> {
    ApiError::check_fields(NameRule::Dotted.check("name", &request.name).into_iter().collect())?;

    require_project(&state, project_id).await?;
    if state
        .storage
        .app_name_exists(project_id, &request.name)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "App name '{}' is already in use in this project",
            request.name
        )));
    }

    let app = state
        .storage
        .create_app(NewApp {
            project_id,
            name: request.name,
            description: request.description,
            created_by: auth.user_id,
        })
        .await?;

    info!("Created app {} in project {}", app.name, project_id);
    Ok((StatusCode::CREATED, Json(app)))
}

/// GET /projects/{project_id}/apps
#[utoipa::path(
    get,
    path = "/projects/{project_id}/apps",
    tag = "Apps",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Apps of the project", body = Vec<App>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_apps(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<App>>, ApiError> {
    require_project(&state, project_id).await?;
    Ok(Json(state.storage.list_apps(project_id).await?))
}

/// GET /apps/{app_id}
#[utoipa::path(
    get,
    path = "/apps/{app_id}",
    tag = "Apps",
    params(("app_id" = Uuid, Path, description = "App UUID")),
    responses(
        (status = 200, description = "App", body = App),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "App not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_app(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(app_id): Path<Uuid>,
) -> Result<Json<App>, ApiError> {
    Ok(Json(require_app(&state, app_id).await?))
}

/// GET /apps/{app_id}/usage - What the app sends and receives, and where
#[utoipa::path(
    get,
    path = "/apps/{app_id}/usage",
    tag = "Apps",
    params(("app_id" = Uuid, Path, description = "App UUID")),
    responses(
        (status = 200, description = "Usage matrix", body = AppUsageMatrix),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "App not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_app_usage(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(app_id): Path<Uuid>,
) -> Result<Json<AppUsageMatrix>, ApiError> {
    require_app(&state, app_id).await?;
    Ok(Json(usage_matrix(state.storage.as_ref(), app_id).await?))
}

/// POST /apps/{app_id}/connections - Link the app to a message through a resource
#[utoipa::path(
    post,
    path = "/apps/{app_id}/connections",
    tag = "Apps",
    params(("app_id" = Uuid, Path, description = "App UUID")),
    request_body = CreateConnectionRequest,
    responses(
        (status = 201, description = "Link created", body = AppResourceMessage),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "App, resource or message not found in the app's project"),
        (status = 409, description = "Link already exists"),
        (status = 422, description = "Invalid direction")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_connection(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(app_id): Path<Uuid>,
    Json(request): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<AppResourceMessage>), ApiError> {
    let mut fields = Vec::new();
    let direction: Option<Direction> = check_token("direction", &request.direction, &mut fields);
    ApiError::check_fields(fields)?;
    let Some(direction) = direction else {
        return Err(ApiError::bad_request("direction is required"));
    };

    let app = require_app(&state, app_id).await?;
    let resource = state
        .storage
        .get_resource(request.resource_id)
        .await?
        .filter(|resource| resource.project_id == app.project_id)
        .ok_or_else(|| ApiError::not_found("Resource not found in the app's project"))?;
    let message = state
        .storage
        .get_message(request.message_id)
        .await?
        .filter(|message| message.project_id == app.project_id)
        .ok_or_else(|| ApiError::not_found("Message not found in the app's project"))?;

    if state
        .storage
        .app_resource_message_exists(app.id, resource.id, message.id, direction)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "App '{}' already {} '{}' through '{}'",
            app.name, direction, message.name, resource.name
        )));
    }

    let link = state
        .storage
        .create_app_resource_message(NewAppResourceMessage {
            app_id: app.id,
            resource_id: resource.id,
            message_id: message.id,
            direction,
            created_by: auth.user_id,
        })
        .await?;

    info!(
        "App {} {} {} through {}",
        app.name, direction, message.name, resource.name
    );
    Ok((StatusCode::CREATED, Json(link)))
}
