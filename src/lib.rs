// Catalog API for event-driven architecture metadata
pub mod api;

// Re-export api modules at crate root (so routes can use crate::services, crate::models)
pub use api::middleware;
pub use api::models;
pub use api::routes;
pub use api::services;
pub use api::storage;
