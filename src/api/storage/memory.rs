//! In-memory storage backend implementation.
//!
//! Used when no `DATABASE_URL` is configured and as the test double for the
//! import pipeline. Enforces the same uniqueness rules as the PostgreSQL
//! schema; every method takes the lock once, so each call is atomic.

use super::{StorageError, traits::StorageBackend};
use crate::models::{
    App, AppResourceMessage, Direction, EntityStatus, Message, NewApp, NewAppResourceMessage,
    NewMessage, NewProject, NewResource, NewSchema, NewServer, Project, Resource,
    ResourceBinding, Schema, SchemaVersion, Server,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    projects: Vec<Project>,
    servers: Vec<Server>,
    resources: Vec<Resource>,
    bindings: Vec<ResourceBinding>,
    schemas: Vec<Schema>,
    schema_versions: Vec<SchemaVersion>,
    messages: Vec<Message>,
    apps: Vec<App>,
    links: Vec<AppResourceMessage>,
}

impl MemoryState {
    fn active_project(&self, project_id: Uuid) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == project_id && p.is_active())
    }

    fn server_name_taken(&self, project_id: Uuid, name: &str) -> bool {
        self.servers.iter().any(|s| {
            s.project_id == project_id && s.name == name && s.status == EntityStatus::Active
        })
    }

    fn resource_name_taken(&self, server_id: Uuid, name: &str) -> bool {
        self.resources.iter().any(|r| {
            r.server_id == server_id && r.name == name && r.status == EntityStatus::Active
        })
    }

    fn schema_name_taken(&self, project_id: Uuid, name: &str) -> bool {
        self.schemas.iter().any(|s| {
            s.project_id == project_id && s.name == name && s.status == EntityStatus::Active
        })
    }

    fn message_name_taken(&self, project_id: Uuid, name: &str) -> bool {
        self.messages.iter().any(|m| {
            m.project_id == project_id && m.name == name && m.status == EntityStatus::Active
        })
    }

    fn app_name_taken(&self, project_id: Uuid, name: &str) -> bool {
        self.apps.iter().any(|a| {
            a.project_id == project_id && a.name == name && a.status == EntityStatus::Active
        })
    }

    fn link_exists(
        &self,
        app_id: Uuid,
        resource_id: Uuid,
        message_id: Uuid,
        direction: Direction,
    ) -> bool {
        self.links.iter().any(|l| {
            l.app_id == app_id
                && l.resource_id == resource_id
                && l.message_id == message_id
                && l.direction == direction
                && l.status == EntityStatus::Active
        })
    }
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorageBackend {
    state: RwLock<MemoryState>,
}

impl MemoryStorageBackend {
    /// Create an empty in-memory storage backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn create_project(&self, project: NewProject) -> Result<Project, StorageError> {
        let mut state = self.state.write().await;
        let name = project.name.trim().to_string();
        if state
            .projects
            .iter()
            .any(|p| p.name == name && p.is_active())
        {
            return Err(StorageError::conflict("project", name));
        }

        let now = Utc::now();
        let created = Project {
            id: Uuid::new_v4(),
            name,
            description: project.description,
            is_private: false,
            created_by: project.created_by,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, StorageError> {
        let state = self.state.read().await;
        Ok(state.active_project(project_id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn project_name_exists(&self, name: &str) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .any(|p| p.name == name && p.is_active()))
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id && p.is_active())
            .ok_or_else(|| StorageError::not_found("project", project_id))?;
        project.status = EntityStatus::Deleted;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn create_server(&self, server: NewServer) -> Result<Server, StorageError> {
        let mut state = self.state.write().await;
        let name = server.name.trim().to_string();
        if state.active_project(server.project_id).is_none() {
            return Err(StorageError::not_found("project", server.project_id));
        }
        if state.server_name_taken(server.project_id, &name) {
            return Err(StorageError::conflict("server", name));
        }

        let now = Utc::now();
        let created = Server {
            id: Uuid::new_v4(),
            project_id: server.project_id,
            name,
            description: server.description,
            protocol: server.protocol,
            status: EntityStatus::Active,
            created_by: server.created_by,
            created_at: now,
            updated_at: now,
        };
        state.servers.push(created.clone());
        Ok(created)
    }

    async fn get_server(&self, server_id: Uuid) -> Result<Option<Server>, StorageError> {
        let state = self.state.read().await;
        Ok(state.servers.iter().find(|s| s.id == server_id).cloned())
    }

    async fn list_servers(&self, project_id: Uuid) -> Result<Vec<Server>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .servers
            .iter()
            .filter(|s| s.project_id == project_id && s.status == EntityStatus::Active)
            .cloned()
            .collect())
    }

    async fn server_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.server_name_taken(project_id, name))
    }

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, StorageError> {
        let mut state = self.state.write().await;
        let name = resource.name.trim().to_string();
        if !state.servers.iter().any(|s| s.id == resource.server_id) {
            return Err(StorageError::not_found("server", resource.server_id));
        }
        if state.resource_name_taken(resource.server_id, &name) {
            return Err(StorageError::conflict("resource", name));
        }

        let now = Utc::now();
        let created = Resource {
            id: Uuid::new_v4(),
            server_id: resource.server_id,
            project_id: resource.project_id,
            name,
            mode: resource.mode,
            resource_type: resource.resource_type,
            description: resource.description,
            status: EntityStatus::Active,
            created_by: resource.created_by,
            created_at: now,
            updated_at: now,
        };
        state.resources.push(created.clone());
        Ok(created)
    }

    async fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, StorageError> {
        let state = self.state.read().await;
        Ok(state.resources.iter().find(|r| r.id == resource_id).cloned())
    }

    async fn list_resources(&self, server_id: Uuid) -> Result<Vec<Resource>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .resources
            .iter()
            .filter(|r| r.server_id == server_id && r.status == EntityStatus::Active)
            .cloned()
            .collect())
    }

    async fn resource_name_exists(
        &self,
        server_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.resource_name_taken(server_id, name))
    }

    async fn create_binding(
        &self,
        source_resource_id: Uuid,
        target_resource_id: Uuid,
    ) -> Result<ResourceBinding, StorageError> {
        let mut state = self.state.write().await;
        for id in [source_resource_id, target_resource_id] {
            if !state.resources.iter().any(|r| r.id == id) {
                return Err(StorageError::not_found("resource", id));
            }
        }
        if state
            .bindings
            .iter()
            .any(|binding| binding.connects(source_resource_id, target_resource_id))
        {
            return Err(StorageError::conflict(
                "binding",
                format!("{source_resource_id} <-> {target_resource_id}"),
            ));
        }

        let created = ResourceBinding {
            id: Uuid::new_v4(),
            source_resource_id,
            target_resource_id,
            created_at: Utc::now(),
        };
        state.bindings.push(created.clone());
        Ok(created)
    }

    async fn binding_exists(&self, a: Uuid, b: Uuid) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.bindings.iter().any(|binding| binding.connects(a, b)))
    }

    async fn list_bindings(&self, server_id: Uuid) -> Result<Vec<ResourceBinding>, StorageError> {
        let state = self.state.read().await;
        let resource_ids: Vec<Uuid> = state
            .resources
            .iter()
            .filter(|r| r.server_id == server_id)
            .map(|r| r.id)
            .collect();
        Ok(state
            .bindings
            .iter()
            .filter(|binding| resource_ids.iter().any(|id| binding.touches(*id)))
            .cloned()
            .collect())
    }

    async fn create_schema(&self, schema: NewSchema) -> Result<Schema, StorageError> {
        let mut state = self.state.write().await;
        let name = schema.name.trim().to_string();
        if state.active_project(schema.project_id).is_none() {
            return Err(StorageError::not_found("project", schema.project_id));
        }
        if state.schema_name_taken(schema.project_id, &name) {
            return Err(StorageError::conflict("schema", name));
        }

        let now = Utc::now();
        let created = Schema {
            id: Uuid::new_v4(),
            project_id: schema.project_id,
            name,
            description: schema.description,
            schema_type: schema.schema_type,
            schema: schema.schema,
            version: 1,
            status: EntityStatus::Active,
            created_by: schema.created_by,
            created_at: now,
            updated_at: now,
        };
        state.schema_versions.push(SchemaVersion {
            id: Uuid::new_v4(),
            schema_id: created.id,
            version: created.version,
            schema: created.schema.clone(),
            created_by: created.created_by,
            created_at: now,
        });
        state.schemas.push(created.clone());
        Ok(created)
    }

    async fn get_schema(&self, schema_id: Uuid) -> Result<Option<Schema>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .schemas
            .iter()
            .find(|s| s.id == schema_id && s.status == EntityStatus::Active)
            .cloned())
    }

    async fn list_schemas(&self, project_id: Uuid) -> Result<Vec<Schema>, StorageError> {
        let state = self.state.read().await;
        let mut schemas: Vec<Schema> = state
            .schemas
            .iter()
            .filter(|s| s.project_id == project_id && s.status == EntityStatus::Active)
            .cloned()
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schemas)
    }

    async fn schema_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.schema_name_taken(project_id, name))
    }

    async fn create_schema_version(
        &self,
        schema_id: Uuid,
        schema_text: String,
        created_by: Uuid,
    ) -> Result<Schema, StorageError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let schema = state
            .schemas
            .iter_mut()
            .find(|s| s.id == schema_id && s.status == EntityStatus::Active)
            .ok_or_else(|| StorageError::not_found("schema", schema_id))?;

        schema.version += 1;
        schema.schema = schema_text;
        schema.updated_at = now;
        let updated = schema.clone();

        state.schema_versions.push(SchemaVersion {
            id: Uuid::new_v4(),
            schema_id,
            version: updated.version,
            schema: updated.schema.clone(),
            created_by,
            created_at: now,
        });
        Ok(updated)
    }

    async fn list_schema_versions(
        &self,
        schema_id: Uuid,
    ) -> Result<Vec<SchemaVersion>, StorageError> {
        let state = self.state.read().await;
        let mut versions: Vec<SchemaVersion> = state
            .schema_versions
            .iter()
            .filter(|v| v.schema_id == schema_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn get_schema_version(
        &self,
        schema_id: Uuid,
        version: i32,
    ) -> Result<Option<SchemaVersion>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .schema_versions
            .iter()
            .find(|v| v.schema_id == schema_id && v.version == version)
            .cloned())
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StorageError> {
        let mut state = self.state.write().await;
        let name = message.name.trim().to_string();
        if state.message_name_taken(message.project_id, &name) {
            return Err(StorageError::conflict("message", name));
        }
        if !state
            .schema_versions
            .iter()
            .any(|v| v.schema_id == message.schema_id && v.version == message.schema_version)
        {
            return Err(StorageError::not_found(
                "schema version",
                format!("{}@{}", message.schema_id, message.schema_version),
            ));
        }

        let created = Message {
            id: Uuid::new_v4(),
            project_id: message.project_id,
            name,
            description: message.description,
            schema_id: message.schema_id,
            schema_version: message.schema_version,
            status: EntityStatus::Active,
            created_by: message.created_by,
            created_at: Utc::now(),
        };
        state.messages.push(created.clone());
        Ok(created)
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .find(|m| m.id == message_id && m.status == EntityStatus::Active)
            .cloned())
    }

    async fn list_messages(&self, project_id: Uuid) -> Result<Vec<Message>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.project_id == project_id && m.status == EntityStatus::Active)
            .cloned()
            .collect())
    }

    async fn message_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.message_name_taken(project_id, name))
    }

    async fn create_app(&self, app: NewApp) -> Result<App, StorageError> {
        let mut state = self.state.write().await;
        let name = app.name.trim().to_string();
        if state.app_name_taken(app.project_id, &name) {
            return Err(StorageError::conflict("app", name));
        }

        let now = Utc::now();
        let created = App {
            id: Uuid::new_v4(),
            project_id: app.project_id,
            name,
            description: app.description,
            status: EntityStatus::Active,
            created_by: app.created_by,
            created_at: now,
            updated_at: now,
        };
        state.apps.push(created.clone());
        Ok(created)
    }

    async fn get_app(&self, app_id: Uuid) -> Result<Option<App>, StorageError> {
        let state = self.state.read().await;
        Ok(state.apps.iter().find(|a| a.id == app_id).cloned())
    }

    async fn list_apps(&self, project_id: Uuid) -> Result<Vec<App>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .apps
            .iter()
            .filter(|a| a.project_id == project_id && a.status == EntityStatus::Active)
            .cloned()
            .collect())
    }

    async fn app_name_exists(&self, project_id: Uuid, name: &str) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.app_name_taken(project_id, name))
    }

    async fn create_app_resource_message(
        &self,
        link: NewAppResourceMessage,
    ) -> Result<AppResourceMessage, StorageError> {
        let mut state = self.state.write().await;
        if state.link_exists(link.app_id, link.resource_id, link.message_id, link.direction) {
            return Err(StorageError::conflict(
                "app resource message",
                format!("{} {} via {}", link.direction, link.message_id, link.resource_id),
            ));
        }

        let created = AppResourceMessage {
            id: Uuid::new_v4(),
            app_id: link.app_id,
            resource_id: link.resource_id,
            message_id: link.message_id,
            direction: link.direction,
            status: EntityStatus::Active,
            created_by: link.created_by,
            created_at: Utc::now(),
        };
        state.links.push(created.clone());
        Ok(created)
    }

    async fn list_app_resource_messages(
        &self,
        app_id: Uuid,
    ) -> Result<Vec<AppResourceMessage>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .links
            .iter()
            .filter(|l| l.app_id == app_id && l.status == EntityStatus::Active)
            .cloned()
            .collect())
    }

    async fn app_resource_message_exists(
        &self,
        app_id: Uuid,
        resource_id: Uuid,
        message_id: Uuid,
        direction: Direction,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.link_exists(app_id, resource_id, message_id, direction))
    }
}
