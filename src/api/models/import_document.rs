//! Bulk architecture document accepted by the project import endpoints.
//!
//! Every scalar field defaults to empty so that missing fields surface as
//! validation errors instead of parse failures. Only structurally broken
//! documents (bad YAML, wrong node kinds) are rejected at parse time.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportDocument {
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<SchemaImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<AppImport>,
}

impl ImportDocument {
    pub const SUPPORTED_VERSION: i64 = 1;

    /// Parse YAML (or JSON, which is a YAML subset) text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let document: Option<ImportDocument> = serde_yaml::from_str(text)?;
        Ok(document.unwrap_or_default())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Copy with surrounding whitespace removed from every name and every
    /// name reference, matching what storage persists.
    pub fn trimmed(&self) -> Self {
        let mut document = self.clone();
        for server in &mut document.servers {
            trim_in_place(&mut server.name);
            for resource in &mut server.resources {
                trim_in_place(&mut resource.name);
            }
            for bind in &mut server.binds {
                trim_in_place(&mut bind.source);
                trim_in_place(&mut bind.target);
            }
        }
        for schema in &mut document.schemas {
            trim_in_place(&mut schema.name);
        }
        for message in &mut document.messages {
            trim_in_place(&mut message.name);
            trim_in_place(&mut message.schema.name);
        }
        for app in &mut document.apps {
            trim_in_place(&mut app.name);
            for usage in app.sends.iter_mut().chain(app.receives.iter_mut()) {
                trim_in_place(&mut usage.message);
            }
        }
        document
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServerImport {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub server_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<ResourceImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binds: Vec<BindImport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceImport {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BindImport {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchemaImport {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub schema_type: String,
    /// Informational only; imported schemas always start at version 1.
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageImport {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: SchemaRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchemaRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppImport {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sends: Vec<UsageImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receives: Vec<UsageImport>,
}

/// A `sends` or `receives` entry of an app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageImport {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub resource: String,
}
