//! Project routes, including project-wide import and export.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use crate::models::{NewProject, Project};
use crate::services::{ImportReport, NameRule};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Import document submitted as text.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub yaml: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub message: String,
    pub created: ImportReport,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    pub yaml: String,
}

pub fn projects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/{project_id}", get(get_project).delete(delete_project))
        .route("/{project_id}/imports", post(import_project))
        .route("/{project_id}/imports/validator", post(validate_import))
        .route("/{project_id}/exports", get(export_project))
}

/// Load an active project or fail with 404.
pub(crate) async fn require_project(state: &AppState, project_id: Uuid) -> Result<Project, ApiError> {
    state
        .storage
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// POST /projects - Create a project
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Project name already in use"),
        (status = 422, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let name = request.name.trim();
    ApiError::check_fields(NameRule::Project.check("name", name).into_iter().collect())?;

    if state.storage.project_name_exists(name).await? {
        return Err(ApiError::conflict(format!(
            "Project name '{}' is already in use",
            name
        )));
    }

    let project = state
        .storage
        .create_project(NewProject {
            name: name.to_string(),
            description: request.description,
            created_by: auth.user_id,
        })
        .await?;

    info!("Created project {} ({})", project.name, project.id);
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects - List active projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "Active projects", body = Vec<Project>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.storage.list_projects().await?))
}

/// GET /projects/{project_id}
#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(require_project(&state, project_id).await?))
}

/// DELETE /projects/{project_id} - Soft-delete a project
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.storage.delete_project(project_id).await?;
    info!("Project {} deleted by {}", project_id, auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /projects/{project_id}/imports/validator - Validate an import document
#[utoipa::path(
    post,
    path = "/projects/{project_id}/imports/validator",
    tag = "Imports",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Document is valid"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Validation errors, as {\"errors\": [...]}"),
        (status = 422, description = "Document could not be parsed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate_import(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<Value>, ApiError> {
    require_project(&state, project_id).await?;
    state
        .import_service()
        .validate(&request.yaml, project_id)
        .await?;
    Ok(Json(json!({ "message": "YAML is valid" })))
}

/// POST /projects/{project_id}/imports - Validate and import a document
#[utoipa::path(
    post,
    path = "/projects/{project_id}/imports",
    tag = "Imports",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import completed", body = ImportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Validation errors, or a failed import with the entities it created"),
        (status = 422, description = "Document could not be parsed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn import_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    require_project(&state, project_id).await?;
    let created = state
        .import_service()
        .import(&request.yaml, project_id, auth.user_id)
        .await?;

    Ok(Json(ImportResponse {
        message: "Import completed successfully".to_string(),
        created,
    }))
}

/// GET /projects/{project_id}/exports - Render the project as an import document
#[utoipa::path(
    get,
    path = "/projects/{project_id}/exports",
    tag = "Imports",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Import document for the project", body = ExportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_project(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ExportResponse>, ApiError> {
    require_project(&state, project_id).await?;
    let document = state.export_service().export_project(project_id).await?;
    let yaml = document.to_yaml().map_err(|e| {
        tracing::error!("Failed to render export for project {}: {}", project_id, e);
        ApiError::internal()
    })?;
    Ok(Json(ExportResponse { yaml }))
}
