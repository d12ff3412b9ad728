//! JSON Schema compilation.
//!
//! The import validator and the schema endpoints both go through
//! [`SchemaCompiler`], so a schema accepted by one is accepted by the other.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaCompilationError {
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("schema must contain a '$schema' keyword")]
    MissingSchemaKeyword,
    #[error("{0}")]
    Compilation(String),
}

/// Pass/fail oracle for schema text. Implementations must be pure.
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, schema_text: &str) -> Result<(), SchemaCompilationError>;
}

/// Compiles JSON Schema documents with the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaCompiler;

impl JsonSchemaCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Stricter check used when a schema is created or revised directly:
    /// the text must also declare its dialect via `$schema`.
    pub fn compile_declared(&self, schema_text: &str) -> Result<(), SchemaCompilationError> {
        let value = parse_json(schema_text)?;
        if value.get("$schema").is_none() {
            return Err(SchemaCompilationError::MissingSchemaKeyword);
        }
        compile_value(&value)
    }
}

fn parse_json(schema_text: &str) -> Result<Value, SchemaCompilationError> {
    serde_json::from_str(schema_text)
        .map_err(|e| SchemaCompilationError::InvalidJson(e.to_string()))
}

fn compile_value(value: &Value) -> Result<(), SchemaCompilationError> {
    jsonschema::validator_for(value)
        .map(|_| ())
        .map_err(|e| SchemaCompilationError::Compilation(e.to_string()))
}

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, schema_text: &str) -> Result<(), SchemaCompilationError> {
        compile_value(&parse_json(schema_text)?)
    }
}
