//! Schema routes. Every accepted schema text must compile, and each update
//! appends a new immutable version.

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
use crate::models::{NewSchema, Schema, SchemaType, SchemaVersion};
use crate::services::NameRule;
use crate::services::input_contracts::{check_schema_text, check_token};

fn default_schema_type() -> String {
    SchemaType::Jsonschema.to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSchemaRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,
    /// Raw JSON Schema text
    pub schema: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSchemaRequest {
    pub schema: String,
}

pub fn project_schemas_router() -> Router<AppState> {
    Router::new().route(
        "/{project_id}/schemas",
        get(list_schemas).post(create_schema),
    )
}

pub fn schemas_router() -> Router<AppState> {
    Router::new()
        .route("/{schema_id}", get(get_schema).put(update_schema))
        .route("/{schema_id}/versions", get(list_schema_versions))
        .route("/{schema_id}/versions/{version}", get(get_schema_version))
}

async fn require_schema(state: &AppState, schema_id: Uuid) -> Result<Schema, ApiError> {
    state
        .storage
        .get_schema(schema_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Schema not found"))
}

/// POST /projects/{project_id}/schemas
#[utoipa::path(
    post,
    path = "/projects/{project_id}/schemas",
    tag = "Schemas",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateSchemaRequest,
    responses(
        (status = 201, description = "Schema created at version 1", body = Schema),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Schema name already in use in the project"),
        (status = 422, description = "Invalid name, type or schema text")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_schema(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateSchemaRequest>,
) -> Result<(StatusCode, Json<Schema>), ApiError> {
    let mut fields: Vec<_> = NameRule::Identifier
        .check("name", &request.name)
        .into_iter()
        .collect();
    let schema_type: Option<SchemaType> = check_token("type", &request.schema_type, &mut fields);
    fields.extend(check_schema_text("schema", &request.schema));
    ApiError::check_fields(fields)?;
    let Some(schema_type) = schema_type else {
        return Err(ApiError::bad_request("type is required"));
    };

    require_project(&state, project_id).await?;
    if state
        .storage
        .schema_name_exists(project_id, &request.name)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Schema name '{}' is already in use in this project",
            request.name
        )));
    }

    let schema = state
        .storage
        .create_schema(NewSchema {
            project_id,
            name: request.name,
            description: request.description,
            schema_type,
            schema: request.schema,
            created_by: auth.user_id,
        })
        .await?;

    info!("Created schema {} in project {}", schema.name, project_id);
    Ok((StatusCode::CREATED, Json(schema)))
}

/// GET /projects/{project_id}/schemas
#[utoipa::path(
    get,
    path = "/projects/{project_id}/schemas",
    tag = "Schemas",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Schemas of the project at their current version", body = Vec<Schema>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_schemas(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Schema>>, ApiError> {
    require_project(&state, project_id).await?;
    Ok(Json(state.storage.list_schemas(project_id).await?))
}

/// GET /schemas/{schema_id}
#[utoipa::path(
    get,
    path = "/schemas/{schema_id}",
    tag = "Schemas",
    params(("schema_id" = Uuid, Path, description = "Schema UUID")),
    responses(
        (status = 200, description = "Schema at its current version", body = Schema),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schema not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_schema(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(schema_id): Path<Uuid>,
) -> Result<Json<Schema>, ApiError> {
    Ok(Json(require_schema(&state, schema_id).await?))
}

/// PUT /schemas/{schema_id} - Publish the next version of a schema
#[utoipa::path(
    put,
    path = "/schemas/{schema_id}",
    tag = "Schemas",
    params(("schema_id" = Uuid, Path, description = "Schema UUID")),
    request_body = UpdateSchemaRequest,
    responses(
        (status = 200, description = "Schema moved to its next version", body = Schema),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schema not found"),
        (status = 422, description = "Schema text does not compile")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_schema(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(schema_id): Path<Uuid>,
    Json(request): Json<UpdateSchemaRequest>,
) -> Result<Json<Schema>, ApiError> {
    ApiError::check_fields(check_schema_text("schema", &request.schema).into_iter().collect())?;
    require_schema(&state, schema_id).await?;

    let schema = state
        .storage
        .create_schema_version(schema_id, request.schema, auth.user_id)
        .await?;

    info!("Schema {} moved to version {}", schema.name, schema.version);
    Ok(Json(schema))
}

/// GET /schemas/{schema_id}/versions
#[utoipa::path(
    get,
    path = "/schemas/{schema_id}/versions",
    tag = "Schemas",
    params(("schema_id" = Uuid, Path, description = "Schema UUID")),
    responses(
        (status = 200, description = "All versions, oldest first", body = Vec<SchemaVersion>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schema not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_schema_versions(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(schema_id): Path<Uuid>,
) -> Result<Json<Vec<SchemaVersion>>, ApiError> {
    require_schema(&state, schema_id).await?;
    Ok(Json(state.storage.list_schema_versions(schema_id).await?))
}

/// GET /schemas/{schema_id}/versions/{version}
#[utoipa::path(
    get,
    path = "/schemas/{schema_id}/versions/{version}",
    tag = "Schemas",
    params(
        ("schema_id" = Uuid, Path, description = "Schema UUID"),
        ("version" = i32, Path, description = "Version number, starting at 1")
    ),
    responses(
        (status = 200, description = "Schema version", body = SchemaVersion),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schema or version not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_schema_version(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path((schema_id, version)): Path<(Uuid, i32)>,
) -> Result<Json<SchemaVersion>, ApiError> {
    require_schema(&state, schema_id).await?;
    state
        .storage
        .get_schema_version(schema_id, version)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Schema version {} not found", version)))
}
