//! Message routes.

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
use crate::models::{Message, NewMessage};
use crate::services::NameRule;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schema_id: Uuid,
    /// Schema version the message is pinned to
    pub schema_version: i32,
}

pub fn project_messages_router() -> Router<AppState> {
    Router::new().route(
        "/{project_id}/messages",
        get(list_messages).post(create_message),
    )
}

/// POST /projects/{project_id}/messages
#[utoipa::path(
    post,
    path = "/projects/{project_id}/messages",
    tag = "Messages",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created", body = Message),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project, schema or schema version not found"),
        (status = 409, description = "Message name already in use in the project"),
        (status = 422, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_message(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    ApiError::check_fields(
        NameRule::Identifier
            .check("name", &request.name)
            .into_iter()
            .collect(),
    )?;

    require_project(&state, project_id).await?;

    // The schema must live in the same project as the message.
    let schema = state
        .storage
        .get_schema(request.schema_id)
        .await?
        .filter(|schema| schema.project_id == project_id)
        .ok_or_else(|| ApiError::not_found("Schema not found in this project"))?;

    if state
        .storage
        .get_schema_version(schema.id, request.schema_version)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Schema '{}' has no version {}",
            schema.name, request.schema_version
        )));
    }

    if state
        .storage
        .message_name_exists(project_id, &request.name)
        .await?
    {
        return Err(ApiError::conflict(format!(
            "Message name '{}' is already in use in this project",
            request.name
        )));
    }

    let message = state
        .storage
        .create_message(NewMessage {
            project_id,
            name: request.name,
            description: request.description,
            schema_id: schema.id,
            schema_version: request.schema_version,
            created_by: auth.user_id,
        })
        .await?;

    info!(
        "Created message {} pinned to {} v{}",
        message.name, schema.name, message.schema_version
    );
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /projects/{project_id}/messages
#[utoipa::path(
    get,
    path = "/projects/{project_id}/messages",
    tag = "Messages",
    params(("project_id" = Uuid, Path, description = "Project UUID")),
    responses(
        (status = 200, description = "Messages of the project", body = Vec<Message>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    require_project(&state, project_id).await?;
    Ok(Json(state.storage.list_messages(project_id).await?))
}
