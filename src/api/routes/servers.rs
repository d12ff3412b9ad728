//! Server, resource and binding routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
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
    NewResource, NewServer, Protocol, Resource, ResourceBinding, ResourceMode, ResourceType,
    Server,
};
use crate::services::NameRule;
use crate::services::input_contracts::check_token;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub protocol: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateResourceRequest {
    pub name: String,
    pub mode: String,
    pub resource_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBindingRequest {
    pub source_resource_id: Uuid,
    pub target_resource_id: Uuid,
}

/// Routes nested under /projects
pub fn project_servers_router() -> Router<AppState> {
    Router::new().route(
        "/{project_id}/servers",
        get(list_servers).post(create_server),
    )
}

pub fn servers_router() -> Router<AppState> {
    Router::new()
        .route("/{server_id}", get(get_server))
        .route(
            "/{server_id}/resources",
            get(list_resources).post(create_resource),
        )
        .route("/{server_id}/binds", get(list_bindings).post(create_binding))
}

async fn require_server(state: &AppState, server_id: Uuid) -> Result<Server, ApiError> {
    state
        .storage
        .get_server(server_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Server not found"))
}

async fn require_resource(state: &AppState, resource_id: Uuid) -> Result<Resource, ApiError> {
    state
        .storage
        .get_resource(resource_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Resource {} not found", resource_id)))
}

/// POST /projects/{project_id}/servers
#[utoipa::path(
    post,
    path = "/projects/{project_id}/servers",
    tag = "Servers",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateServerRequest,
    responses(
        (status = 201, description = "Server created", body = Server),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Server name already in use in the project"),
        (status = 422, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_server(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateServerRequest>,
) -> Result<(StatusCode, Json<Server>), ApiError> {
    let mut fields: Vec<_> = NameRule::Dotted.check("name", &request.name).into_iter().collect();
    let protocol: Option<Protocol> = check_token("protocol", &request.protocol, &mut fields);
    ApiError::check_fields(fields)?;
    let Some(protocol) = protocol else {
        return Err(ApiError::bad_request("protocol is required"));
    };

    require_project(&state, project_id).await?;
    if state
        .storage
        .server_name_exists(project_id, &request.name)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Server name '{}' is already in use in this project",
            request.name
        )));
    }

    let server = state
        .storage
        .create_server(NewServer {
            project_id,
            name: request.name,
            description: request.description,
            protocol,
            created_by: auth.user_id,
        })
        .await?;

    info!("Created server {} in project {}", server.name, project_id);
    Ok((StatusCode::CREATED, Json(server)))
}

/// GET /projects/{project_id}/servers
#[utoipa::path(
    get,
    path = "/projects/{project_id}/servers",
    tag = "Servers",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Servers of the project", body = Vec<Server>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_servers(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Server>>, ApiError> {
    require_project(&state, project_id).await?;
    Ok(Json(state.storage.list_servers(project_id).await?))
}

/// GET /servers/{server_id}
#[utoipa::path(
    get,
    path = "/servers/{server_id}",
    tag = "Servers",
    params(("server_id" = Uuid, Path, description = "Server UUID")),
    responses(
        (status = 200, description = "Server", body = Server),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Server not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_server(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(server_id): Path<Uuid>,
) -> Result<Json<Server>, ApiError> {
    Ok(Json(require_server(&state, server_id).await?))
}

/// POST /servers/{server_id}/resources
#[utoipa::path(
    post,
    path = "/servers/{server_id}/resources",
    tag = "Servers",
    params(("server_id" = Uuid, Path, description = "Server UUID")),
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = Resource),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Server not found"),
        (status = 409, description = "Resource name already in use on the server"),
        (status = 422, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_resource(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(server_id): Path<Uuid>,
    Json(request): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let mut fields: Vec<_> = NameRule::Resource
        .check("name", &request.name)
        .into_iter()
        .collect();
    let mode: Option<ResourceMode> = check_token("mode", &request.mode, &mut fields);
    let resource_type: Option<ResourceType> =
        check_token("resource_type", &request.resource_type, &mut fields);
    ApiError::check_fields(fields)?;
    let (Some(mode), Some(resource_type)) = (mode, resource_type) else {
        return Err(ApiError::bad_request("mode and resource_type are required"));
    };

    let server = require_server(&state, server_id).await?;
    if state
        .storage
        .resource_name_exists(server_id, &request.name)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Resource name '{}' is already in use on server '{}'",
            request.name, server.name
        )));
    }

    let resource = state
        .storage
        .create_resource(NewResource {
            server_id,
            project_id: server.project_id,
            name: request.name,
            mode,
            resource_type,
            description: request.description,
            created_by: auth.user_id,
        })
        .await?;

    info!("Created resource {} on server {}", resource.name, server.name);
    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /servers/{server_id}/resources
#[utoipa::path(
    get,
    path = "/servers/{server_id}/resources",
    tag = "Servers",
    params(("server_id" = Uuid, Path, description = "Server UUID")),
    responses(
        (status = 200, description = "Resources of the server", body = Vec<Resource>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Server not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_resources(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(server_id): Path<Uuid>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    require_server(&state, server_id).await?;
    Ok(Json(state.storage.list_resources(server_id).await?))
}

/// POST /servers/{server_id}/binds - Bind two resources of the server
#[utoipa::path(
    post,
    path = "/servers/{server_id}/binds",
    tag = "Servers",
    params(("server_id" = Uuid, Path, description = "Server UUID")),
    request_body = CreateBindingRequest,
    responses(
        (status = 201, description = "Binding created", body = ResourceBinding),
        (status = 400, description = "Resources are not both on this server"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Server or resource not found"),
        (status = 409, description = "Binding already exists in either direction")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_binding(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(server_id): Path<Uuid>,
    Json(request): Json<CreateBindingRequest>,
) -> Result<(StatusCode, Json<ResourceBinding>), ApiError> {
    let server = require_server(&state, server_id).await?;
    let source = require_resource(&state, request.source_resource_id).await?;
    let target = require_resource(&state, request.target_resource_id).await?;

    if source.id == target.id {
        return Err(ApiError::bad_request("A resource cannot be bound to itself"));
    }
    if source.server_id != target.server_id {
        return Err(ApiError::bad_request(
            "Resources must belong to the same server",
        ));
    }
    if source.server_id != server.id {
        return Err(ApiError::bad_request(format!(
            "Resources must belong to server '{}'",
            server.name
        )));
    }
    if state.storage.binding_exists(source.id, target.id).await? {
        return Err(ApiError::conflict(format!(
            "Resources '{}' and '{}' are already bound",
            source.name, target.name
        )));
    }

    let binding = state.storage.create_binding(source.id, target.id).await?;
    info!(
        "Bound resources {} and {} on server {}",
        source.name, target.name, server.name
    );
    Ok((StatusCode::CREATED, Json(binding)))
}

/// GET /servers/{server_id}/binds
#[utoipa::path(
    get,
    path = "/servers/{server_id}/binds",
    tag = "Servers",
    params(("server_id" = Uuid, Path, description = "Server UUID")),
    responses(
        (status = 200, description = "Bindings touching the server's resources", body = Vec<ResourceBinding>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Server not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_bindings(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(server_id): Path<Uuid>,
) -> Result<Json<Vec<ResourceBinding>>, ApiError> {
    require_server(&state, server_id).await?;
    Ok(Json(state.storage.list_bindings(server_id).await?))
}
