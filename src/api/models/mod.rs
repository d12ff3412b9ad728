// Models module - catalog entities, enums and the import document

pub mod app;
#[path = "enums.rs"]
pub mod enums;
pub mod import_document;
pub mod message;
pub mod project;
pub mod schema;
pub mod server;

pub use app::{
    App, AppResourceMessage, AppUsage, AppUsageMatrix, NewApp, NewAppResourceMessage,
    UsageMessage, UsageResource, UsageServer,
};
pub use enums::{Direction, EntityStatus, Protocol, ResourceMode, ResourceType, SchemaType};
pub use import_document::ImportDocument;
pub use message::{Message, NewMessage};
pub use project::{NewProject, Project};
pub use schema::{NewSchema, Schema, SchemaVersion};
pub use server::{NewResource, NewServer, Resource, ResourceBinding, Server};
