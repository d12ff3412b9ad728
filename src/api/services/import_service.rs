//! Import pipeline: parse, validate, then materialize.

use super::import_materializer::{ImportMaterializer, ImportReport};
use super::import_validator::ImportValidator;
use super::schema_compiler::SchemaCompiler;
use crate::models::ImportDocument;
use crate::storage::{StorageBackend, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The text is not an import document at all.
    #[error("failed to parse import document: {0}")]
    Malformed(String),
    /// The document parsed but has problems; every problem is listed.
    #[error("import document has {} validation error(s)", .0.len())]
    Validation(Vec<String>),
    /// A stage of the import failed after `created` had been persisted.
    #[error("{message}")]
    Materialization {
        message: String,
        created: ImportReport,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ImportService {
    validator: ImportValidator,
    materializer: ImportMaterializer,
}

impl ImportService {
    pub fn new(storage: Arc<dyn StorageBackend>, compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            validator: ImportValidator::new(storage.clone(), compiler),
            materializer: ImportMaterializer::new(storage),
        }
    }

    pub fn parse(text: &str) -> Result<ImportDocument, ImportError> {
        ImportDocument::from_yaml(text).map_err(|e| ImportError::Malformed(e.to_string()))
    }

    /// Validate only. Never writes.
    pub async fn validate(&self, text: &str, project_id: Uuid) -> Result<(), ImportError> {
        let document = Self::parse(text)?;
        self.check(&document, project_id).await
    }

    /// Validate, then materialize. Nothing is written when validation fails.
    pub async fn import(
        &self,
        text: &str,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<ImportReport, ImportError> {
        let document = Self::parse(text)?;
        self.check(&document, project_id).await?;
        self.materializer
            .materialize(&document, project_id, user_id)
            .await
    }

    async fn check(&self, document: &ImportDocument, project_id: Uuid) -> Result<(), ImportError> {
        info!(
            "Validating import document for project {}: {} server(s), {} schema(s), {} message(s), {} app(s)",
            project_id,
            document.servers.len(),
            document.schemas.len(),
            document.messages.len(),
            document.apps.len()
        );

        let errors = self.validator.validate(document, project_id).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            info!(
                "Import document for project {} rejected with {} error(s)",
                project_id,
                errors.len()
            );
            Err(ImportError::Validation(errors))
        }
    }
}
