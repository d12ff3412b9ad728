//! Services module - catalog business logic and the import/export pipeline.

pub mod export_service;
pub mod import_materializer;
pub mod import_service;
pub mod import_validator;
pub mod input_contracts;
pub mod jwt_service;
pub mod resource_uri;
pub mod schema_compiler;
pub mod usage_service;

// Re-export for convenience
pub use export_service::ExportService;
pub use import_materializer::{ImportMaterializer, ImportReport, ResourceKey};
pub use import_service::{ImportError, ImportService};
pub use import_validator::ImportValidator;
pub use input_contracts::{FieldError, NameRule};
pub use jwt_service::{Claims, JwtError, JwtService, SharedJwtService, TokenPair, TokenType};
pub use resource_uri::{ResourceReference, ResourceUriError};
pub use schema_compiler::{JsonSchemaCompiler, SchemaCompilationError, SchemaCompiler};
