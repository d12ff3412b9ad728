use super::enums::{Direction, EntityStatus, Protocol, ResourceMode, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A producer/consumer of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct App {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApp {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
}

/// "This app sends/receives this message through this resource."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppResourceMessage {
    pub id: Uuid,
    pub app_id: Uuid,
    pub resource_id: Uuid,
    pub message_id: Uuid,
    pub direction: Direction,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppResourceMessage {
    pub app_id: Uuid,
    pub resource_id: Uuid,
    pub message_id: Uuid,
    pub direction: Direction,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageMessage {
    pub id: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    pub schema_version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageResource {
    pub id: Uuid,
    pub name: String,
    pub mode: ResourceMode,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageServer {
    pub id: Uuid,
    pub name: String,
    pub protocol: Protocol,
}

/// One resolved link of an app's usage matrix.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppUsage {
    pub message: UsageMessage,
    pub resource: UsageResource,
    pub server: UsageServer,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppUsageMatrix {
    pub app_id: Uuid,
    pub sends: Vec<AppUsage>,
    pub receives: Vec<AppUsage>,
}
