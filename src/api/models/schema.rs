use super::enums::{EntityStatus, SchemaType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A named JSON Schema. `schema` and `version` always mirror the latest
/// [`SchemaVersion`] row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Schema {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    pub schema: String,
    pub version: i32,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchema {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub schema_type: SchemaType,
    pub schema: String,
    pub created_by: Uuid,
}

/// Immutable history row, one per version starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchemaVersion {
    pub id: Uuid,
    pub schema_id: Uuid,
    pub version: i32,
    pub schema: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
