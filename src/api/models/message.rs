use super::enums::EntityStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A payload definition pinned to one specific schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub schema_id: Uuid,
    pub schema_version: i32,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub schema_id: Uuid,
    pub schema_version: i32,
    pub created_by: Uuid,
}
