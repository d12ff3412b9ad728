//! Renders a project back into an import document.
//!
//! Re-importing the result into an empty project validates clean. Messages
//! are exported by schema name only, so a re-import pins them to the latest
//! schema version.

use super::resource_uri::ResourceReference;
use crate::models::import_document::{
    AppImport, BindImport, MessageImport, ResourceImport, SchemaImport, SchemaRef, ServerImport,
    UsageImport,
};
use crate::models::{Direction, ImportDocument, Resource, Server};
use crate::storage::{StorageBackend, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ExportService {
    storage: Arc<dyn StorageBackend>,
}

impl ExportService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn export_project(&self, project_id: Uuid) -> Result<ImportDocument, StorageError> {
        let mut document = ImportDocument {
            version: ImportDocument::SUPPORTED_VERSION,
            ..Default::default()
        };

        // resource id -> (server, resource), for app wiring
        let mut addressable: HashMap<Uuid, (Server, Resource)> = HashMap::new();

        for server in self.storage.list_servers(project_id).await? {
            let resources = self.storage.list_resources(server.id).await?;
            let names: HashMap<Uuid, &str> = resources
                .iter()
                .map(|r| (r.id, r.name.as_str()))
                .collect();

            let binds = self
                .storage
                .list_bindings(server.id)
                .await?
                .into_iter()
                .filter_map(|binding| {
                    let source = names.get(&binding.source_resource_id)?;
                    let target = names.get(&binding.target_resource_id)?;
                    Some(BindImport {
                        source: source.to_string(),
                        target: target.to_string(),
                    })
                })
                .collect();

            document.servers.push(ServerImport {
                name: server.name.clone(),
                server_type: server.protocol.to_string(),
                description: server.description.clone(),
                resources: resources
                    .iter()
                    .map(|r| ResourceImport {
                        name: r.name.clone(),
                        mode: r.mode.to_string(),
                        resource_type: r.resource_type.to_string(),
                        description: r.description.clone(),
                    })
                    .collect(),
                binds,
            });

            for resource in resources {
                addressable.insert(resource.id, (server.clone(), resource));
            }
        }

        let mut schema_names = HashMap::new();
        for schema in self.storage.list_schemas(project_id).await? {
            schema_names.insert(schema.id, schema.name.clone());
            document.schemas.push(SchemaImport {
                name: schema.name,
                schema_type: schema.schema_type.to_string(),
                version: i64::from(schema.version),
                description: schema.description,
                schema: schema.schema,
            });
        }

        let mut message_names = HashMap::new();
        for message in self.storage.list_messages(project_id).await? {
            let Some(schema_name) = schema_names.get(&message.schema_id) else {
                warn!(
                    "Message {} references schema {} outside the project; not exported",
                    message.name, message.schema_id
                );
                continue;
            };
            message_names.insert(message.id, message.name.clone());
            document.messages.push(MessageImport {
                name: message.name,
                description: message.description,
                schema: SchemaRef {
                    name: schema_name.clone(),
                },
            });
        }

        for app in self.storage.list_apps(project_id).await? {
            let mut exported = AppImport {
                name: app.name,
                description: app.description,
                ..Default::default()
            };

            for link in self.storage.list_app_resource_messages(app.id).await? {
                let (Some(message), Some((server, resource))) = (
                    message_names.get(&link.message_id),
                    addressable.get(&link.resource_id),
                ) else {
                    continue;
                };
                let usage = UsageImport {
                    message: message.clone(),
                    resource: ResourceReference::new(
                        server.protocol,
                        &server.name,
                        resource.mode,
                        resource.resource_type,
                        &resource.name,
                    )
                    .to_string(),
                };
                match link.direction {
                    Direction::Sends => exported.sends.push(usage),
                    Direction::Receives => exported.receives.push(usage),
                }
            }

            document.apps.push(exported);
        }

        debug!(
            "Exported project {}: {} server(s), {} schema(s), {} message(s), {} app(s)",
            project_id,
            document.servers.len(),
            document.schemas.len(),
            document.messages.len(),
            document.apps.len()
        );
        Ok(document)
    }
}
