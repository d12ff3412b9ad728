//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the StorageBackend trait.
//! Enum columns are stored as TEXT and parsed back through `FromStr`.

use super::{StorageError, traits::StorageBackend};
use crate::models::{
    App, AppResourceMessage, Direction, EntityStatus, Message, NewApp, NewAppResourceMessage,
    NewMessage, NewProject, NewResource, NewSchema, NewServer, Project, Resource,
    ResourceBinding, Schema, SchemaVersion, Server,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn connection_error(e: sqlx::Error) -> StorageError {
    StorageError::ConnectionError(e.to_string())
}

/// Unique-index violations surface as conflicts, everything else as a
/// connection error.
fn insert_error(e: sqlx::Error, entity_type: &str, name: &str) -> StorageError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return StorageError::conflict(entity_type, name);
    }
    connection_error(e)
}

fn parse_column<T>(value: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StorageError::Other(e.to_string()))
}

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    description: String,
    is_private: bool,
    created_by: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StorageError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            name: row.name,
            description: row.description,
            is_private: row.is_private,
            created_by: row.created_by,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ServerRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    description: String,
    protocol: String,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServerRow> for Server {
    type Error = StorageError;

    fn try_from(row: ServerRow) -> Result<Self, Self::Error> {
        Ok(Server {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            protocol: parse_column(&row.protocol)?,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ResourceRow {
    id: Uuid,
    server_id: Uuid,
    project_id: Uuid,
    name: String,
    mode: String,
    resource_type: String,
    description: String,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StorageError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            id: row.id,
            server_id: row.server_id,
            project_id: row.project_id,
            name: row.name,
            mode: parse_column(&row.mode)?,
            resource_type: parse_column(&row.resource_type)?,
            description: row.description,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BindingRow {
    id: Uuid,
    source_resource_id: Uuid,
    target_resource_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<BindingRow> for ResourceBinding {
    fn from(row: BindingRow) -> Self {
        ResourceBinding {
            id: row.id,
            source_resource_id: row.source_resource_id,
            target_resource_id: row.target_resource_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct SchemaRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    description: String,
    schema_type: String,
    schema: String,
    version: i32,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SchemaRow> for Schema {
    type Error = StorageError;

    fn try_from(row: SchemaRow) -> Result<Self, Self::Error> {
        Ok(Schema {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            schema_type: parse_column(&row.schema_type)?,
            schema: row.schema,
            version: row.version,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SchemaVersionRow {
    id: Uuid,
    schema_id: Uuid,
    version: i32,
    schema: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<SchemaVersionRow> for SchemaVersion {
    fn from(row: SchemaVersionRow) -> Self {
        SchemaVersion {
            id: row.id,
            schema_id: row.schema_id,
            version: row.version,
            schema: row.schema,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    description: String,
    schema_id: Uuid,
    schema_version: i32,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StorageError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            schema_id: row.schema_id,
            schema_version: row.schema_version,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AppRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    description: String,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppRow> for App {
    type Error = StorageError;

    fn try_from(row: AppRow) -> Result<Self, Self::Error> {
        Ok(App {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LinkRow {
    id: Uuid,
    app_id: Uuid,
    resource_id: Uuid,
    message_id: Uuid,
    direction: String,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for AppResourceMessage {
    type Error = StorageError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(AppResourceMessage {
            id: row.id,
            app_id: row.app_id,
            resource_id: row.resource_id,
            message_id: row.message_id,
            direction: parse_column(&row.direction)?,
            status: parse_column(&row.status)?,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StorageError>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const PROJECT_COLUMNS: &str =
    "id, name, description, is_private, created_by, status, created_at, updated_at";
const SERVER_COLUMNS: &str =
    "id, project_id, name, description, protocol, status, created_by, created_at, updated_at";
const RESOURCE_COLUMNS: &str = "id, server_id, project_id, name, mode, resource_type, description, status, created_by, created_at, updated_at";
const SCHEMA_COLUMNS: &str = "id, project_id, name, description, schema_type, schema, version, status, created_by, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, project_id, name, description, schema_id, schema_version, status, created_by, created_at";
const APP_COLUMNS: &str =
    "id, project_id, name, description, status, created_by, created_at, updated_at";
const LINK_COLUMNS: &str =
    "id, app_id, resource_id, message_id, direction, status, created_by, created_at";

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn create_project(&self, project: NewProject) -> Result<Project, StorageError> {
        let name = project.name.trim().to_string();
        let row: ProjectRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO projects (id, name, description, is_private, created_by, status)
            VALUES ($1, $2, $3, FALSE, $4, 'active')
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&project.description)
        .bind(project.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "project", &name))?;

        row.try_into()
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, StorageError> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND status = 'active'"
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        row.map(Project::try_from).transpose()
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE status = 'active' ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn project_name_exists(&self, name: &str) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE name = $1 AND status = 'active')",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE projects SET status = 'deleted', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(connection_error)?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::not_found("project", project_id));
        }
        Ok(())
    }

    async fn create_server(&self, server: NewServer) -> Result<Server, StorageError> {
        let name = server.name.trim().to_string();
        let row: Option<ServerRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO servers (id, project_id, name, description, protocol, status, created_by)
            SELECT $1, $2, $3, $4, $5, 'active', $6
            WHERE EXISTS (SELECT 1 FROM projects WHERE id = $2 AND status = 'active')
            RETURNING {SERVER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(server.project_id)
        .bind(&name)
        .bind(&server.description)
        .bind(server.protocol.as_str())
        .bind(server.created_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| insert_error(e, "server", &name))?;

        row.ok_or_else(|| StorageError::not_found("project", server.project_id))?
            .try_into()
    }

    async fn get_server(&self, server_id: Uuid) -> Result<Option<Server>, StorageError> {
        let row: Option<ServerRow> = sqlx::query_as(&format!(
            "SELECT {SERVER_COLUMNS} FROM servers WHERE id = $1"
        ))
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        row.map(Server::try_from).transpose()
    }

    async fn list_servers(&self, project_id: Uuid) -> Result<Vec<Server>, StorageError> {
        let rows: Vec<ServerRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SERVER_COLUMNS} FROM servers
            WHERE project_id = $1 AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn server_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM servers
                WHERE project_id = $1 AND name = $2 AND status = 'active'
            )
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn create_resource(&self, resource: NewResource) -> Result<Resource, StorageError> {
        let name = resource.name.trim().to_string();
        let row: ResourceRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO resources
                (id, server_id, project_id, name, mode, resource_type, description, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', $8)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(resource.server_id)
        .bind(resource.project_id)
        .bind(&name)
        .bind(resource.mode.as_str())
        .bind(resource.resource_type.as_str())
        .bind(&resource.description)
        .bind(resource.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "resource", &name))?;

        row.try_into()
    }

    async fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, StorageError> {
        let row: Option<ResourceRow> = sqlx::query_as(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        row.map(Resource::try_from).transpose()
    }

    async fn list_resources(&self, server_id: Uuid) -> Result<Vec<Resource>, StorageError> {
        let rows: Vec<ResourceRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS} FROM resources
            WHERE server_id = $1 AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn resource_name_exists(
        &self,
        server_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM resources
                WHERE server_id = $1 AND name = $2 AND status = 'active'
            )
            "#,
        )
        .bind(server_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn create_binding(
        &self,
        source_resource_id: Uuid,
        target_resource_id: Uuid,
    ) -> Result<ResourceBinding, StorageError> {
        let row: BindingRow = sqlx::query_as(
            r#"
            INSERT INTO resource_bindings (id, source_resource_id, target_resource_id)
            VALUES ($1, $2, $3)
            RETURNING id, source_resource_id, target_resource_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(source_resource_id)
        .bind(target_resource_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            insert_error(
                e,
                "binding",
                &format!("{source_resource_id} <-> {target_resource_id}"),
            )
        })?;

        Ok(row.into())
    }

    async fn binding_exists(&self, a: Uuid, b: Uuid) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM resource_bindings
                WHERE (source_resource_id = $1 AND target_resource_id = $2)
                   OR (source_resource_id = $2 AND target_resource_id = $1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn list_bindings(&self, server_id: Uuid) -> Result<Vec<ResourceBinding>, StorageError> {
        let rows: Vec<BindingRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT b.id, b.source_resource_id, b.target_resource_id, b.created_at
            FROM resource_bindings b
            JOIN resources r ON r.id = b.source_resource_id OR r.id = b.target_resource_id
            WHERE r.server_id = $1
            ORDER BY b.created_at
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        Ok(rows.into_iter().map(ResourceBinding::from).collect())
    }

    async fn create_schema(&self, schema: NewSchema) -> Result<Schema, StorageError> {
        let name = schema.name.trim().to_string();
        let mut tx = self.pool.begin().await.map_err(connection_error)?;

        let row: Option<SchemaRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO schemas
                (id, project_id, name, description, schema_type, schema, version, status, created_by)
            SELECT $1, $2, $3, $4, $5, $6, 1, 'active', $7
            WHERE EXISTS (SELECT 1 FROM projects WHERE id = $2 AND status = 'active')
            RETURNING {SCHEMA_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(schema.project_id)
        .bind(&name)
        .bind(&schema.description)
        .bind(schema.schema_type.as_str())
        .bind(&schema.schema)
        .bind(schema.created_by)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| insert_error(e, "schema", &name))?;
        // Dropping the transaction rolls it back.
        let row = row.ok_or_else(|| StorageError::not_found("project", schema.project_id))?;

        sqlx::query(
            r#"
            INSERT INTO schema_versions (id, schema_id, version, schema, created_by)
            VALUES ($1, $2, 1, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.id)
        .bind(&row.schema)
        .bind(row.created_by)
        .execute(&mut *tx)
        .await
        .map_err(connection_error)?;

        tx.commit().await.map_err(connection_error)?;
        row.try_into()
    }

    async fn get_schema(&self, schema_id: Uuid) -> Result<Option<Schema>, StorageError> {
        let row: Option<SchemaRow> = sqlx::query_as(&format!(
            "SELECT {SCHEMA_COLUMNS} FROM schemas WHERE id = $1 AND status = 'active'"
        ))
        .bind(schema_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        row.map(Schema::try_from).transpose()
    }

    async fn list_schemas(&self, project_id: Uuid) -> Result<Vec<Schema>, StorageError> {
        let rows: Vec<SchemaRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SCHEMA_COLUMNS} FROM schemas
            WHERE project_id = $1 AND status = 'active'
            ORDER BY name
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn schema_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM schemas
                WHERE project_id = $1 AND name = $2 AND status = 'active'
            )
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn create_schema_version(
        &self,
        schema_id: Uuid,
        schema_text: String,
        created_by: Uuid,
    ) -> Result<Schema, StorageError> {
        let mut tx = self.pool.begin().await.map_err(connection_error)?;

        // Row lock serialises concurrent revisions of the same schema.
        let row: Option<SchemaRow> = sqlx::query_as(&format!(
            r#"
            UPDATE schemas
            SET version = version + 1, schema = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {SCHEMA_COLUMNS}
            "#
        ))
        .bind(schema_id)
        .bind(&schema_text)
        .fetch_optional(&mut *tx)
        .await
        .map_err(connection_error)?;

        let row = row.ok_or_else(|| StorageError::not_found("schema", schema_id))?;

        sqlx::query(
            r#"
            INSERT INTO schema_versions (id, schema_id, version, schema, created_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(schema_id)
        .bind(row.version)
        .bind(&schema_text)
        .bind(created_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, "schema version", &row.version.to_string()))?;

        tx.commit().await.map_err(connection_error)?;
        row.try_into()
    }

    async fn list_schema_versions(
        &self,
        schema_id: Uuid,
    ) -> Result<Vec<SchemaVersion>, StorageError> {
        let rows: Vec<SchemaVersionRow> = sqlx::query_as(
            r#"
            SELECT id, schema_id, version, schema, created_by, created_at
            FROM schema_versions
            WHERE schema_id = $1
            ORDER BY version
            "#,
        )
        .bind(schema_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        Ok(rows.into_iter().map(SchemaVersion::from).collect())
    }

    async fn get_schema_version(
        &self,
        schema_id: Uuid,
        version: i32,
    ) -> Result<Option<SchemaVersion>, StorageError> {
        let row: Option<SchemaVersionRow> = sqlx::query_as(
            r#"
            SELECT id, schema_id, version, schema, created_by, created_at
            FROM schema_versions
            WHERE schema_id = $1 AND version = $2
            "#,
        )
        .bind(schema_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        Ok(row.map(SchemaVersion::from))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StorageError> {
        let name = message.name.trim().to_string();
        let row: MessageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO messages
                (id, project_id, name, description, schema_id, schema_version, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(message.project_id)
        .bind(&name)
        .bind(&message.description)
        .bind(message.schema_id)
        .bind(message.schema_version)
        .bind(message.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.is_foreign_key_violation()
            {
                return StorageError::not_found(
                    "schema version",
                    format!("{}@{}", message.schema_id, message.schema_version),
                );
            }
            insert_error(e, "message", &name)
        })?;

        row.try_into()
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, StorageError> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 AND status = 'active'"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(connection_error)?;

        row.map(Message::try_from).transpose()
    }

    async fn list_messages(&self, project_id: Uuid) -> Result<Vec<Message>, StorageError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE project_id = $1 AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn message_name_exists(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM messages
                WHERE project_id = $1 AND name = $2 AND status = 'active'
            )
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn create_app(&self, app: NewApp) -> Result<App, StorageError> {
        let name = app.name.trim().to_string();
        let row: AppRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO apps (id, project_id, name, description, status, created_by)
            VALUES ($1, $2, $3, $4, 'active', $5)
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(app.project_id)
        .bind(&name)
        .bind(&app.description)
        .bind(app.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "app", &name))?;

        row.try_into()
    }

    async fn get_app(&self, app_id: Uuid) -> Result<Option<App>, StorageError> {
        let row: Option<AppRow> =
            sqlx::query_as(&format!("SELECT {APP_COLUMNS} FROM apps WHERE id = $1"))
                .bind(app_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(connection_error)?;

        row.map(App::try_from).transpose()
    }

    async fn list_apps(&self, project_id: Uuid) -> Result<Vec<App>, StorageError> {
        let rows: Vec<AppRow> = sqlx::query_as(&format!(
            r#"
            SELECT {APP_COLUMNS} FROM apps
            WHERE project_id = $1 AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn app_name_exists(&self, project_id: Uuid, name: &str) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM apps
                WHERE project_id = $1 AND name = $2 AND status = 'active'
            )
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }

    async fn create_app_resource_message(
        &self,
        link: NewAppResourceMessage,
    ) -> Result<AppResourceMessage, StorageError> {
        let row: LinkRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO app_resource_messages
                (id, app_id, resource_id, message_id, direction, status, created_by)
            VALUES ($1, $2, $3, $4, $5, 'active', $6)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(link.app_id)
        .bind(link.resource_id)
        .bind(link.message_id)
        .bind(link.direction.as_str())
        .bind(link.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            insert_error(
                e,
                "app resource message",
                &format!("{} {} via {}", link.direction, link.message_id, link.resource_id),
            )
        })?;

        row.try_into()
    }

    async fn list_app_resource_messages(
        &self,
        app_id: Uuid,
    ) -> Result<Vec<AppResourceMessage>, StorageError> {
        let rows: Vec<LinkRow> = sqlx::query_as(&format!(
            r#"
            SELECT {LINK_COLUMNS} FROM app_resource_messages
            WHERE app_id = $1 AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(app_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection_error)?;

        convert_all(rows)
    }

    async fn app_resource_message_exists(
        &self,
        app_id: Uuid,
        resource_id: Uuid,
        message_id: Uuid,
        direction: Direction,
    ) -> Result<bool, StorageError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM app_resource_messages
                WHERE app_id = $1 AND resource_id = $2 AND message_id = $3
                  AND direction = $4 AND status = $5
            )
            "#,
        )
        .bind(app_id)
        .bind(resource_id)
        .bind(message_id)
        .bind(direction.as_str())
        .bind(EntityStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(connection_error)
    }
}
