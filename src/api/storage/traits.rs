//! Storage trait definitions for the catalog storage backends.
//!
//! Name-existence checks only consider active rows. `create_*` methods
//! enforce the same uniqueness rules and return [`StorageError::Conflict`]
//! when a concurrent writer got there first.

use super::StorageError;
use crate::models::{
    App, AppResourceMessage, Direction, Message, NewApp, NewAppResourceMessage, NewMessage,
    NewProject, NewResource, NewSchema, NewServer, Project, Resource, ResourceBinding, Schema,
    SchemaVersion, Server,
};
use uuid::Uuid;

/// Storage backend trait for catalog entities
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    // Projects

    async fn create_project(&self, project: NewProject) -> Result<Project, StorageError>;

    /// Get an active project by ID
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, StorageError>;

    /// List active projects ordered by name
    async fn list_projects(&self) -> Result<Vec<Project>, StorageError>;

    async fn project_name_exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Soft-delete a project; its name becomes reusable
    async fn delete_project(&self, project_id: Uuid) -> Result<(), StorageError>;

    // Servers

    async fn create_server(&self, server: NewServer) -> Result<Server, StorageError>;

    async fn get_server(&self, server_id: Uuid) -> Result<Option<Server>, StorageError>;

    async fn list_servers(&self, project_id: Uuid) -> Result<Vec<Server>, StorageError>;

    async fn server_name_exists(&self, project_id: Uuid, name: &str)
    -> Result<bool, StorageError>;

    // Resources

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, StorageError>;

    async fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, StorageError>;

    async fn list_resources(&self, server_id: Uuid) -> Result<Vec<Resource>, StorageError>;

    async fn resource_name_exists(
        &self,
        server_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError>;

    // Bindings

    async fn create_binding(
        &self,
        source_resource_id: Uuid,
        target_resource_id: Uuid,
    ) -> Result<ResourceBinding, StorageError>;

    /// Order-independent: `(a, b)` and `(b, a)` are the same binding
    async fn binding_exists(&self, a: Uuid, b: Uuid) -> Result<bool, StorageError>;

    /// Bindings touching any resource of the server, each reported once
    async fn list_bindings(&self, server_id: Uuid) -> Result<Vec<ResourceBinding>, StorageError>;

    // Schemas

    /// Create a schema together with its version 1 row, atomically
    async fn create_schema(&self, schema: NewSchema) -> Result<Schema, StorageError>;

    async fn get_schema(&self, schema_id: Uuid) -> Result<Option<Schema>, StorageError>;

    async fn list_schemas(&self, project_id: Uuid) -> Result<Vec<Schema>, StorageError>;

    async fn schema_name_exists(&self, project_id: Uuid, name: &str)
    -> Result<bool, StorageError>;

    /// Append the next version and move the schema head to it, atomically
    async fn create_schema_version(
        &self,
        schema_id: Uuid,
        schema_text: String,
        created_by: Uuid,
    ) -> Result<Schema, StorageError>;

    /// All versions in ascending order
    async fn list_schema_versions(
        &self,
        schema_id: Uuid,
    ) -> Result<Vec<SchemaVersion>, StorageError>;

    async fn get_schema_version(
        &self,
        schema_id: Uuid,
        version: i32,
    ) -> Result<Option<SchemaVersion>, StorageError>;

    // Messages

    async fn create_message(&self, message: NewMessage) -> Result<Message, StorageError>;

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, StorageError>;

    async fn list_messages(&self, project_id: Uuid) -> Result<Vec<Message>, StorageError>;

    async fn message_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError>;

    // Apps

    async fn create_app(&self, app: NewApp) -> Result<App, StorageError>;

    async fn get_app(&self, app_id: Uuid) -> Result<Option<App>, StorageError>;

    async fn list_apps(&self, project_id: Uuid) -> Result<Vec<App>, StorageError>;

    async fn app_name_exists(&self, project_id: Uuid, name: &str) -> Result<bool, StorageError>;

    // App / resource / message links

    async fn create_app_resource_message(
        &self,
        link: NewAppResourceMessage,
    ) -> Result<AppResourceMessage, StorageError>;

    /// Active links of an app in creation order
    async fn list_app_resource_messages(
        &self,
        app_id: Uuid,
    ) -> Result<Vec<AppResourceMessage>, StorageError>;

    async fn app_resource_message_exists(
        &self,
        app_id: Uuid,
        resource_id: Uuid,
        message_id: Uuid,
        direction: Direction,
    ) -> Result<bool, StorageError>;
}
