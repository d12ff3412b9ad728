//! Application state management.
//!
//! Defines the AppState struct that holds all shared application state: the
//! storage backend, the schema compiler, the JWT service and, in PostgreSQL
//! mode, the connection pool.

use crate::services::{
    ExportService, ImportService, JsonSchemaCompiler, JwtService, SchemaCompiler,
    SharedJwtService,
};
use crate::storage::{MemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError};
use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entity store (in-memory unless DATABASE_URL is configured)
    pub storage: Arc<dyn StorageBackend>,
    /// Compiler used for every schema accepted by the API
    pub compiler: Arc<dyn SchemaCompiler>,
    /// Access token validation
    pub jwt: SharedJwtService,
    /// PostgreSQL database connection pool (optional)
    pub database: Option<PgPool>,
}

impl AppState {
    /// Create application state backed by the in-memory store.
    pub fn new(jwt: JwtService) -> Self {
        Self::with_storage(Arc::new(MemoryStorageBackend::new()), jwt)
    }

    pub fn with_storage(storage: Arc<dyn StorageBackend>, jwt: JwtService) -> Self {
        Self {
            storage,
            compiler: Arc::new(JsonSchemaCompiler::new()),
            jwt: Arc::new(jwt),
            database: None,
        }
    }

    /// Initialize storage backend from environment configuration.
    ///
    /// Connects to PostgreSQL and runs migrations if DATABASE_URL is set,
    /// otherwise keeps the in-memory store.
    pub async fn init_storage(&mut self) -> Result<(), StorageError> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            info!("DATABASE_URL not set, using in-memory storage");
            return Ok(());
        };

        let pool = PgPool::connect(&database_url).await.map_err(|e| {
            StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
        })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))?;

        self.database = Some(pool.clone());
        self.storage = Arc::new(PostgresStorageBackend::new(pool));
        info!("Using PostgreSQL storage");
        Ok(())
    }

    pub fn import_service(&self) -> ImportService {
        ImportService::new(self.storage.clone(), self.compiler.clone())
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(self.storage.clone())
    }

    /// Check if PostgreSQL storage is enabled
    pub fn is_postgres(&self) -> bool {
        self.database.is_some()
    }
}

impl FromRef<AppState> for SharedJwtService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt.clone()
    }
}
