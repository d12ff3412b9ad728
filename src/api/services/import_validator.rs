//! Whole-document validation for project imports.
//!
//! Validation never mutates storage and never stops at the first problem:
//! every detected issue becomes one human-readable line in the returned list.
//! Running it twice on the same document and project yields the same list.

use super::input_contracts::NameRule;
use super::resource_uri::{ResourceReference, normalize};
use super::schema_compiler::SchemaCompiler;
use crate::models::import_document::{AppImport, ServerImport, UsageImport};
use crate::models::{Direction, ImportDocument, Protocol, ResourceMode, ResourceType, SchemaType};
use crate::storage::{StorageBackend, StorageError};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Singular wording used in error lines for a usage direction.
pub(crate) fn usage_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Sends => "send",
        Direction::Receives => "receive",
    }
}

pub struct ImportValidator {
    storage: Arc<dyn StorageBackend>,
    compiler: Arc<dyn SchemaCompiler>,
}

impl ImportValidator {
    pub fn new(storage: Arc<dyn StorageBackend>, compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self { storage, compiler }
    }

    /// Collect every problem in `document` as it would apply to `project_id`.
    ///
    /// An empty list means the document is valid. Only storage failures are
    /// returned as `Err`.
    pub async fn validate(
        &self,
        document: &ImportDocument,
        project_id: Uuid,
    ) -> Result<Vec<String>, StorageError> {
        // Storage trims names, so every comparison below works on trimmed text.
        let document = &document.trimmed();
        let mut errors = Vec::new();

        if document.version != ImportDocument::SUPPORTED_VERSION {
            errors.push(format!(
                "invalid version: {}, expected {}",
                document.version,
                ImportDocument::SUPPORTED_VERSION
            ));
        }

        self.validate_servers(document, project_id, &mut errors)
            .await?;
        let schema_names = self
            .validate_schemas(document, project_id, &mut errors)
            .await?;
        let message_names = self
            .validate_messages(document, project_id, &schema_names, &mut errors)
            .await?;
        self.validate_apps(document, project_id, &message_names, &mut errors)
            .await?;

        debug!(
            "Validated import document for project {}: {} error(s)",
            project_id,
            errors.len()
        );
        Ok(errors)
    }

    async fn validate_servers(
        &self,
        document: &ImportDocument,
        project_id: Uuid,
        errors: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let mut seen = HashSet::new();

        for server in &document.servers {
            if server.name.is_empty() {
                errors.push("server name is required".to_string());
                continue;
            }
            check_length("server", &server.name, NameRule::Dotted, errors);
            if server.server_type.is_empty() {
                errors.push(format!(
                    "server type is required for server: {}",
                    server.name
                ));
                continue;
            }

            let protocol = Protocol::from_str(&server.server_type).ok();
            if protocol.is_none() {
                errors.push(format!(
                    "invalid server type '{}' for server: {}",
                    server.server_type, server.name
                ));
            }

            if !seen.insert(server.name.as_str()) {
                errors.push(format!(
                    "server '{}' is declared more than once in the document",
                    server.name
                ));
            }
            if self
                .storage
                .server_name_exists(project_id, &server.name)
                .await?
            {
                errors.push(format!(
                    "server name '{}' already exists in the project",
                    server.name
                ));
            }

            let declared = validate_resources(server, protocol, errors);
            validate_binds(server, &declared, errors);
        }

        Ok(())
    }

    async fn validate_schemas<'d>(
        &self,
        document: &'d ImportDocument,
        project_id: Uuid,
        errors: &mut Vec<String>,
    ) -> Result<HashSet<&'d str>, StorageError> {
        let mut names = HashSet::new();

        for schema in &document.schemas {
            if schema.name.is_empty() {
                errors.push("schema name is required".to_string());
                continue;
            }
            check_length("schema", &schema.name, NameRule::Identifier, errors);
            if schema.schema_type.is_empty() {
                errors.push(format!(
                    "schema type is required for schema: {}",
                    schema.name
                ));
                continue;
            }
            if schema.schema.is_empty() {
                errors.push(format!(
                    "schema content is required for schema: {}",
                    schema.name
                ));
                continue;
            }

            match SchemaType::from_str(&schema.schema_type) {
                Ok(SchemaType::Jsonschema) => {
                    if let Err(e) = self.compiler.compile(&schema.schema) {
                        errors.push(format!(
                            "invalid JSON schema for schema '{}': {}",
                            schema.name, e
                        ));
                    }
                }
                Err(_) => errors.push(format!(
                    "invalid schema type '{}' for schema: {} (only 'jsonschema' is supported)",
                    schema.schema_type, schema.name
                )),
            }

            if !names.insert(schema.name.as_str()) {
                errors.push(format!(
                    "schema '{}' is declared more than once in the document",
                    schema.name
                ));
            }
            if self
                .storage
                .schema_name_exists(project_id, &schema.name)
                .await?
            {
                errors.push(format!(
                    "schema name '{}' already exists in the project",
                    schema.name
                ));
            }
        }

        Ok(names)
    }

    async fn validate_messages<'d>(
        &self,
        document: &'d ImportDocument,
        project_id: Uuid,
        schema_names: &HashSet<&str>,
        errors: &mut Vec<String>,
    ) -> Result<HashSet<&'d str>, StorageError> {
        let mut names = HashSet::new();

        for message in &document.messages {
            if message.name.is_empty() {
                errors.push("message name is required".to_string());
                continue;
            }
            check_length("message", &message.name, NameRule::Identifier, errors);
            if message.schema.name.is_empty() {
                errors.push(format!(
                    "schema reference is required for message: {}",
                    message.name
                ));
                continue;
            }
            if !schema_names.contains(message.schema.name.as_str()) {
                errors.push(format!(
                    "schema '{}' referenced by message '{}' not found",
                    message.schema.name, message.name
                ));
            }

            if !names.insert(message.name.as_str()) {
                errors.push(format!(
                    "message '{}' is declared more than once in the document",
                    message.name
                ));
            }
            if self
                .storage
                .message_name_exists(project_id, &message.name)
                .await?
            {
                errors.push(format!(
                    "message name '{}' already exists in the project",
                    message.name
                ));
            }
        }

        Ok(names)
    }

    async fn validate_apps(
        &self,
        document: &ImportDocument,
        project_id: Uuid,
        message_names: &HashSet<&str>,
        errors: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let mut seen = HashSet::new();

        for app in &document.apps {
            if app.name.is_empty() {
                errors.push("app name is required".to_string());
                continue;
            }
            check_length("app", &app.name, NameRule::Dotted, errors);

            if !seen.insert(app.name.as_str()) {
                errors.push(format!(
                    "app '{}' is declared more than once in the document",
                    app.name
                ));
            }
            if self
                .storage
                .app_name_exists(project_id, &app.name)
                .await?
            {
                errors.push(format!(
                    "app name '{}' already exists in the project",
                    app.name
                ));
            }

            validate_usages(app, Direction::Sends, &app.sends, message_names, errors);
            validate_usages(
                app,
                Direction::Receives,
                &app.receives,
                message_names,
                errors,
            );
        }

        Ok(())
    }
}

/// Check the resources of one server and return every declared resource name.
///
/// A name is recorded as soon as it is present, so binds see all resources of
/// their server regardless of declaration order or other resource errors.
fn validate_resources<'d>(
    server: &'d ServerImport,
    protocol: Option<Protocol>,
    errors: &mut Vec<String>,
) -> HashSet<&'d str> {
    let mut declared = HashSet::new();

    for resource in &server.resources {
        if resource.name.is_empty() {
            errors.push(format!(
                "resource name is required for server: {}",
                server.name
            ));
            continue;
        }
        check_length("resource", &resource.name, NameRule::Resource, errors);
        if !declared.insert(resource.name.as_str()) {
            errors.push(format!(
                "resource '{}' is declared more than once in server: {}",
                resource.name, server.name
            ));
        }

        if resource.mode.is_empty() {
            errors.push(format!(
                "resource mode is required for resource: {} in server: {}",
                resource.name, server.name
            ));
            continue;
        }
        if resource.resource_type.is_empty() {
            errors.push(format!(
                "resource type is required for resource: {} in server: {}",
                resource.name, server.name
            ));
            continue;
        }

        let mode = ResourceMode::from_str(&resource.mode).ok();
        if mode.is_none() {
            errors.push(format!(
                "invalid mode '{}' for resource: {} in server: {}",
                resource.mode, resource.name, server.name
            ));
        }
        let resource_type = ResourceType::from_str(&resource.resource_type).ok();
        if resource_type.is_none() {
            errors.push(format!(
                "invalid type '{}' for resource: {} in server: {}",
                resource.resource_type, resource.name, server.name
            ));
        }

        // The synthesized reference catches names that no app could address.
        if protocol.is_some() && mode.is_some() && resource_type.is_some() {
            let uri = normalize(&format!(
                "{}://{}@{}/{}/{}",
                server.server_type, server.name, resource.mode, resource.resource_type, resource.name
            ));
            if let Err(e) = ResourceReference::parse(&uri) {
                errors.push(format!(
                    "invalid resource '{}' in server '{}': {}",
                    resource.name, server.name, e
                ));
            }
        }
    }

    declared
}

fn validate_binds(server: &ServerImport, declared: &HashSet<&str>, errors: &mut Vec<String>) {
    let mut pairs = HashSet::new();

    for bind in &server.binds {
        if bind.source.is_empty() || bind.target.is_empty() {
            errors.push(format!(
                "bind source and target are required for server: {}",
                server.name
            ));
            continue;
        }
        if bind.source == bind.target {
            errors.push(format!(
                "resource '{}' cannot be bound to itself in server: {}",
                bind.source, server.name
            ));
            continue;
        }

        let source_known = declared.contains(bind.source.as_str());
        let target_known = declared.contains(bind.target.as_str());
        if !source_known {
            errors.push(format!(
                "bind source '{}' not found in server: {}",
                bind.source, server.name
            ));
        }
        if !target_known {
            errors.push(format!(
                "bind target '{}' not found in server: {}",
                bind.target, server.name
            ));
        }

        if source_known && target_known {
            // Bindings are undirected for duplicate detection.
            let pair = if bind.source <= bind.target {
                (bind.source.as_str(), bind.target.as_str())
            } else {
                (bind.target.as_str(), bind.source.as_str())
            };
            if !pairs.insert(pair) {
                errors.push(format!(
                    "bind between '{}' and '{}' is declared more than once in server: {}",
                    bind.source, bind.target, server.name
                ));
            }
        }
    }
}

/// Names longer than the stored column are rejected up front.
fn check_length(kind: &str, name: &str, rule: NameRule, errors: &mut Vec<String>) {
    if name.chars().count() > rule.max_len() {
        errors.push(format!(
            "{} name '{}' is longer than {} characters",
            kind,
            name,
            rule.max_len()
        ));
    }
}

fn validate_usages(
    app: &AppImport,
    direction: Direction,
    usages: &[UsageImport],
    message_names: &HashSet<&str>,
    errors: &mut Vec<String>,
) {
    let label = usage_label(direction);
    let mut seen = HashSet::new();

    for usage in usages {
        if usage.message.is_empty() {
            errors.push(format!(
                "message is required for {} in app: {}",
                label, app.name
            ));
            continue;
        }
        if usage.resource.is_empty() {
            errors.push(format!(
                "resource is required for {} in app: {}",
                label, app.name
            ));
            continue;
        }

        if !message_names.contains(usage.message.as_str()) {
            errors.push(format!(
                "message '{}' referenced in app '{}' {} not found",
                usage.message, app.name, label
            ));
        }

        match ResourceReference::parse(&usage.resource) {
            Ok(reference) => {
                if !seen.insert((usage.message.as_str(), reference.server, reference.name)) {
                    errors.push(format!(
                        "app '{}' declares {} of message '{}' through '{}' more than once",
                        app.name, label, usage.message, usage.resource
                    ));
                }
            }
            Err(e) => errors.push(format!(
                "invalid resource reference '{}' in app '{}' {}: {}",
                usage.resource, app.name, label, e
            )),
        }
    }
}
