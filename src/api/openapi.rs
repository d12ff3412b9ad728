//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication
        crate::routes::auth::get_auth_status,
        crate::routes::auth::refresh_token,
        // Projects
        crate::routes::projects::create_project,
        crate::routes::projects::list_projects,
        crate::routes::projects::get_project,
        crate::routes::projects::delete_project,
        // Import / export
        crate::routes::projects::validate_import,
        crate::routes::projects::import_project,
        crate::routes::projects::export_project,
        // Servers
        crate::routes::servers::create_server,
        crate::routes::servers::list_servers,
        crate::routes::servers::get_server,
        crate::routes::servers::create_resource,
        crate::routes::servers::list_resources,
        crate::routes::servers::create_binding,
        crate::routes::servers::list_bindings,
        // Schemas
        crate::routes::schemas::create_schema,
        crate::routes::schemas::list_schemas,
        crate::routes::schemas::get_schema,
        crate::routes::schemas::update_schema,
        crate::routes::schemas::list_schema_versions,
        crate::routes::schemas::get_schema_version,
        // Messages
        crate::routes::messages::create_message,
        crate::routes::messages::list_messages,
        // Apps
        crate::routes::apps::create_app,
        crate::routes::apps::list_apps,
        crate::routes::apps::get_app,
        crate::routes::apps::get_app_usage,
        crate::routes::apps::create_connection,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::models::Project,
        crate::models::Server,
        crate::models::Resource,
        crate::models::ResourceBinding,
        crate::models::Schema,
        crate::models::SchemaVersion,
        crate::models::Message,
        crate::models::App,
        crate::models::AppResourceMessage,
        crate::models::AppUsageMatrix,
        crate::models::AppUsage,
        crate::models::UsageMessage,
        crate::models::UsageResource,
        crate::models::UsageServer,
        crate::models::Protocol,
        crate::models::ResourceMode,
        crate::models::ResourceType,
        crate::models::Direction,
        crate::models::EntityStatus,
        crate::models::SchemaType,
        crate::services::ImportReport,
        crate::services::ResourceKey,
        crate::services::FieldError,
        crate::services::TokenPair,
        crate::routes::auth::AuthStatusResponse,
        crate::routes::auth::RefreshTokenRequest,
        crate::routes::projects::CreateProjectRequest,
        crate::routes::projects::ImportRequest,
        crate::routes::projects::ImportResponse,
        crate::routes::projects::ExportResponse,
        crate::routes::servers::CreateServerRequest,
        crate::routes::servers::CreateResourceRequest,
        crate::routes::servers::CreateBindingRequest,
        crate::routes::schemas::CreateSchemaRequest,
        crate::routes::schemas::UpdateSchemaRequest,
        crate::routes::messages::CreateMessageRequest,
        crate::routes::apps::CreateAppRequest,
        crate::routes::apps::CreateConnectionRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Bearer token inspection and refresh"),
        (name = "Projects", description = "Project management"),
        (name = "Imports", description = "Whole-project import, validation and export"),
        (name = "Servers", description = "Servers, their resources and resource bindings"),
        (name = "Schemas", description = "Versioned JSON Schemas"),
        (name = "Messages", description = "Messages pinned to a schema version"),
        (name = "Apps", description = "Apps and their send/receive wiring"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Event Catalog API",
        description = "REST API for cataloguing event-driven architectures",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081/api/v1", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Update version to match Cargo.toml version
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new)
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
    }
}
