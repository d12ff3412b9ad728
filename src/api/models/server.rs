use super::enums::{EntityStatus, Protocol, ResourceMode, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A protocol endpoint (Kafka cluster, AMQP broker, ...) owned by one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Server {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub protocol: Protocol,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServer {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub protocol: Protocol,
    pub created_by: Uuid,
}

/// An addressable unit on a server. Names are unique per server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Resource {
    pub id: Uuid,
    pub server_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub mode: ResourceMode,
    pub resource_type: ResourceType,
    pub description: String,
    pub status: EntityStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub server_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub mode: ResourceMode,
    pub resource_type: ResourceType,
    pub description: String,
    pub created_by: Uuid,
}

/// A directional link between two resources of the same server.
///
/// Existence checks treat `A -> B` and `B -> A` as the same binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceBinding {
    pub id: Uuid,
    pub source_resource_id: Uuid,
    pub target_resource_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ResourceBinding {
    /// True when this binding connects `a` and `b` in either direction.
    pub fn connects(&self, a: Uuid, b: Uuid) -> bool {
        (self.source_resource_id == a && self.target_resource_id == b)
            || (self.source_resource_id == b && self.target_resource_id == a)
    }

    pub fn touches(&self, resource_id: Uuid) -> bool {
        self.source_resource_id == resource_id || self.target_resource_id == resource_id
    }
}
