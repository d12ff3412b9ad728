//! Turns an import document into persisted catalog entities.
//!
//! Stages run strictly in order (servers with their resources and binds,
//! schemas, messages, apps with their wiring) because each stage resolves
//! names to ids produced by the previous ones. There is no surrounding
//! transaction: when a stage fails, everything created before it stays, and
//! the returned error lists exactly what that was.

use super::import_service::ImportError;
use super::import_validator::usage_label;
use super::resource_uri::ResourceReference;
use crate::models::import_document::{AppImport, ServerImport};
use crate::models::{
    Direction, ImportDocument, NewApp, NewAppResourceMessage, NewMessage, NewResource, NewSchema,
    NewServer, Protocol, ResourceMode, ResourceType, SchemaType,
};
use crate::storage::{StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifies a resource by its server name and its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ResourceKey {
    pub server: String,
    pub resource: String,
}

impl ResourceKey {
    pub fn new(server: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.resource)
    }
}

/// What an import persisted, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub servers: Vec<String>,
    pub resources: Vec<ResourceKey>,
    pub bindings: usize,
    pub schemas: Vec<String>,
    pub messages: Vec<String>,
    pub apps: Vec<String>,
    pub links: usize,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
            && self.schemas.is_empty()
            && self.messages.is_empty()
            && self.apps.is_empty()
    }
}

enum StageFailure {
    /// Missing reference or rejected row; reported to the caller verbatim.
    Domain(String),
    /// The store itself failed.
    Storage(StorageError),
}

fn storage_failure(context: String, error: StorageError) -> StageFailure {
    match error {
        StorageError::ConnectionError(_) | StorageError::Other(_) => StageFailure::Storage(error),
        StorageError::NotFound { .. } | StorageError::Conflict { .. } => {
            StageFailure::Domain(format!("{context}: {error}"))
        }
    }
}

pub struct ImportMaterializer {
    storage: Arc<dyn StorageBackend>,
}

impl ImportMaterializer {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Create every entity of `document` inside `project_id`.
    ///
    /// Expects a document that already passed validation, but fails with an
    /// error rather than panicking when a reference cannot be resolved.
    pub async fn materialize(
        &self,
        document: &ImportDocument,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<ImportReport, ImportError> {
        let document = &document.trimmed();
        let mut run = Materialization {
            storage: self.storage.as_ref(),
            project_id,
            user_id,
            report: ImportReport::default(),
            resources: HashMap::new(),
            schemas: HashMap::new(),
            messages: HashMap::new(),
        };

        match run.execute(document).await {
            Ok(()) => {
                info!(
                    "Materialized import into project {}: {} server(s), {} schema(s), {} message(s), {} app(s), {} link(s)",
                    project_id,
                    run.report.servers.len(),
                    run.report.schemas.len(),
                    run.report.messages.len(),
                    run.report.apps.len(),
                    run.report.links
                );
                Ok(run.report)
            }
            Err(StageFailure::Domain(message)) => {
                warn!(
                    "Import into project {} stopped: {} (already created: {:?})",
                    project_id, message, run.report
                );
                Err(ImportError::Materialization {
                    message,
                    created: run.report,
                })
            }
            Err(StageFailure::Storage(e)) => {
                warn!(
                    "Import into project {} hit a storage failure: {} (already created: {:?})",
                    project_id, e, run.report
                );
                Err(ImportError::Storage(e))
            }
        }
    }
}

/// State threaded through the stages of one import.
struct Materialization<'s> {
    storage: &'s dyn StorageBackend,
    project_id: Uuid,
    user_id: Uuid,
    report: ImportReport,
    resources: HashMap<ResourceKey, Uuid>,
    schemas: HashMap<String, Uuid>,
    messages: HashMap<String, Uuid>,
}

impl Materialization<'_> {
    async fn execute(&mut self, document: &ImportDocument) -> Result<(), StageFailure> {
        for server in &document.servers {
            self.create_server(server).await?;
        }
        debug!("Import stage complete: servers");

        self.create_schemas(document).await?;
        debug!("Import stage complete: schemas");

        self.create_messages(document).await?;
        debug!("Import stage complete: messages");

        for app in &document.apps {
            self.create_app(app).await?;
        }
        debug!("Import stage complete: apps");

        Ok(())
    }

    async fn create_server(&mut self, server: &ServerImport) -> Result<(), StageFailure> {
        let failed = |e: String| format!("failed to create server {}: {}", server.name, e);
        let protocol = Protocol::from_str(&server.server_type)
            .map_err(|e| StageFailure::Domain(failed(e.to_string())))?;

        let created = self
            .storage
            .create_server(NewServer {
                project_id: self.project_id,
                name: server.name.clone(),
                description: server.description.clone(),
                protocol,
                created_by: self.user_id,
            })
            .await
            .map_err(|e| storage_failure(format!("failed to create server {}", server.name), e))?;
        self.report.servers.push(created.name.clone());

        for resource in &server.resources {
            let failed = |e: String| {
                format!(
                    "failed to create resource {} in server {}: {}",
                    resource.name, server.name, e
                )
            };
            let mode = ResourceMode::from_str(&resource.mode)
                .map_err(|e| StageFailure::Domain(failed(e.to_string())))?;
            let resource_type = ResourceType::from_str(&resource.resource_type)
                .map_err(|e| StageFailure::Domain(failed(e.to_string())))?;

            let row = self
                .storage
                .create_resource(NewResource {
                    server_id: created.id,
                    project_id: self.project_id,
                    name: resource.name.clone(),
                    mode,
                    resource_type,
                    description: resource.description.clone(),
                    created_by: self.user_id,
                })
                .await
                .map_err(|e| {
                    storage_failure(
                        format!(
                            "failed to create resource {} in server {}",
                            resource.name, server.name
                        ),
                        e,
                    )
                })?;

            let key = ResourceKey::new(&server.name, &resource.name);
            self.resources.insert(key.clone(), row.id);
            self.report.resources.push(key);
        }

        for bind in &server.binds {
            let source = self
                .resources
                .get(&ResourceKey::new(&server.name, &bind.source));
            let target = self
                .resources
                .get(&ResourceKey::new(&server.name, &bind.target));
            let (Some(&source), Some(&target)) = (source, target) else {
                debug!(
                    "Skipping bind {} -> {} in server {}: endpoint not created",
                    bind.source, bind.target, server.name
                );
                continue;
            };
            if source == target {
                debug!(
                    "Skipping bind of {} to itself in server {}",
                    bind.source, server.name
                );
                continue;
            }

            self.storage
                .create_binding(source, target)
                .await
                .map_err(|e| {
                    storage_failure(
                        format!(
                            "failed to create binding between {} and {}",
                            bind.source, bind.target
                        ),
                        e,
                    )
                })?;
            self.report.bindings += 1;
        }

        Ok(())
    }

    async fn create_schemas(&mut self, document: &ImportDocument) -> Result<(), StageFailure> {
        for schema in &document.schemas {
            let schema_type = SchemaType::from_str(&schema.schema_type).map_err(|e| {
                StageFailure::Domain(format!("failed to create schema {}: {}", schema.name, e))
            })?;

            let created = self
                .storage
                .create_schema(NewSchema {
                    project_id: self.project_id,
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    schema_type,
                    schema: schema.schema.clone(),
                    created_by: self.user_id,
                })
                .await
                .map_err(|e| storage_failure(format!("failed to create schema {}", schema.name), e))?;

            self.schemas.insert(schema.name.clone(), created.id);
            self.report.schemas.push(created.name);
        }
        Ok(())
    }

    async fn create_messages(&mut self, document: &ImportDocument) -> Result<(), StageFailure> {
        for message in &document.messages {
            let not_found = || {
                StageFailure::Domain(format!(
                    "schema {} not found for message {}",
                    message.schema.name, message.name
                ))
            };
            let schema_id = *self
                .schemas
                .get(&message.schema.name)
                .ok_or_else(not_found)?;

            // Pin to whatever version is current right now.
            let schema = self
                .storage
                .get_schema(schema_id)
                .await
                .map_err(|e| storage_failure(format!("failed to load schema {}", message.schema.name), e))?
                .ok_or_else(not_found)?;

            let created = self
                .storage
                .create_message(NewMessage {
                    project_id: self.project_id,
                    name: message.name.clone(),
                    description: message.description.clone(),
                    schema_id,
                    schema_version: schema.version,
                    created_by: self.user_id,
                })
                .await
                .map_err(|e| storage_failure(format!("failed to create message {}", message.name), e))?;

            self.messages.insert(message.name.clone(), created.id);
            self.report.messages.push(created.name);
        }
        Ok(())
    }

    async fn create_app(&mut self, app: &AppImport) -> Result<(), StageFailure> {
        let created = self
            .storage
            .create_app(NewApp {
                project_id: self.project_id,
                name: app.name.clone(),
                description: app.description.clone(),
                created_by: self.user_id,
            })
            .await
            .map_err(|e| storage_failure(format!("failed to create app {}", app.name), e))?;
        self.report.apps.push(created.name.clone());

        for (direction, usages) in [
            (Direction::Sends, &app.sends),
            (Direction::Receives, &app.receives),
        ] {
            let label = usage_label(direction);

            for usage in usages {
                let message_id = *self.messages.get(&usage.message).ok_or_else(|| {
                    StageFailure::Domain(format!(
                        "message '{}' not found for app '{}' {}",
                        usage.message, app.name, label
                    ))
                })?;

                let reference = ResourceReference::parse(&usage.resource).map_err(|e| {
                    StageFailure::Domain(format!(
                        "failed to parse resource URI for app '{}' {}: {}",
                        app.name, label, e
                    ))
                })?;

                let key = ResourceKey::new(reference.server, reference.name);
                let resource_id = *self.resources.get(&key).ok_or_else(|| {
                    StageFailure::Domain(format!(
                        "resource '{}' not found for app '{}' {} (looking for key: {})",
                        usage.resource, app.name, label, key
                    ))
                })?;

                self.storage
                    .create_app_resource_message(NewAppResourceMessage {
                        app_id: created.id,
                        resource_id,
                        message_id,
                        direction,
                        created_by: self.user_id,
                    })
                    .await
                    .map_err(|e| {
                        storage_failure(
                            format!("failed to create {} connection for app '{}'", label, app.name),
                            e,
                        )
                    })?;
                self.report.links += 1;
            }
        }

        Ok(())
    }
}
