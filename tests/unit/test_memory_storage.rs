//! Uniqueness, versioning and soft-delete rules of the in-memory store.

use event_catalog_api::models::{
    Direction, EntityStatus, NewApp, NewAppResourceMessage, NewMessage, NewProject, NewResource,
    NewSchema, NewServer, Project, Protocol, Resource, ResourceMode, ResourceType, SchemaType,
    Server,
};
use event_catalog_api::storage::{MemoryStorageBackend, StorageBackend, StorageError};
use uuid::Uuid;

const SCHEMA_V1: &str = r#"{"$schema":"http://json-schema.org/draft-07/schema#","type":"object"}"#;
const SCHEMA_V2: &str = r#"{"$schema":"http://json-schema.org/draft-07/schema#","type":"object","required":["id"]}"#;

async fn project(store: &MemoryStorageBackend, name: &str) -> Project {
    store
        .create_project(NewProject {
            name: name.to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap()
}

async fn server(store: &MemoryStorageBackend, project_id: Uuid, name: &str) -> Server {
    store
        .create_server(NewServer {
            project_id,
            name: name.to_string(),
            description: String::new(),
            protocol: Protocol::Kafka,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap()
}

async fn topic(store: &MemoryStorageBackend, server: &Server, name: &str) -> Resource {
    store
        .create_resource(NewResource {
            server_id: server.id,
            project_id: server.project_id,
            name: name.to_string(),
            mode: ResourceMode::Readwrite,
            resource_type: ResourceType::Topic,
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap()
}

fn new_schema(project_id: Uuid, name: &str) -> NewSchema {
    NewSchema {
        project_id,
        name: name.to_string(),
        description: String::new(),
        schema_type: SchemaType::Jsonschema,
        schema: SCHEMA_V1.to_string(),
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn test_project_names_are_unique_among_active_projects() {
    let store = MemoryStorageBackend::new();
    let first = project(&store, "Shop").await;

    let err = store
        .create_project(NewProject {
            name: "Shop".to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    store.delete_project(first.id).await.unwrap();
    assert!(store.get_project(first.id).await.unwrap().is_none());
    assert!(!store.project_name_exists("Shop").await.unwrap());

    let second = project(&store, "Shop").await;
    assert_ne!(first.id, second.id);
    assert_eq!(second.status, EntityStatus::Active);
    assert_eq!(store.list_projects().await.unwrap(), vec![second]);
}

#[tokio::test]
async fn test_deleting_twice_is_not_found() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Once").await;

    store.delete_project(p.id).await.unwrap();
    assert!(matches!(
        store.delete_project(p.id).await.unwrap_err(),
        StorageError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_server_names_are_scoped_to_their_project() {
    let store = MemoryStorageBackend::new();
    let a = project(&store, "A").await;
    let b = project(&store, "B").await;

    server(&store, a.id, "broker").await;
    server(&store, b.id, "broker").await;

    assert!(store.server_name_exists(a.id, "broker").await.unwrap());
    let err = store
        .create_server(NewServer {
            project_id: a.id,
            name: "broker".to_string(),
            description: String::new(),
            protocol: Protocol::Amqp,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_resource_names_are_scoped_to_their_server() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let left = server(&store, p.id, "left").await;
    let right = server(&store, p.id, "right").await;

    topic(&store, &left, "orders").await;
    topic(&store, &right, "orders").await;

    assert!(store.resource_name_exists(left.id, "orders").await.unwrap());
    assert!(!store.resource_name_exists(left.id, "payments").await.unwrap());
    assert_eq!(store.list_resources(left.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bindings_are_symmetric_for_existence() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let s = server(&store, p.id, "broker").await;
    let orders = topic(&store, &s, "orders").await;
    let audit = topic(&store, &s, "audit").await;

    let binding = store.create_binding(orders.id, audit.id).await.unwrap();
    assert_eq!(binding.source_resource_id, orders.id);
    assert_eq!(binding.target_resource_id, audit.id);

    assert!(store.binding_exists(orders.id, audit.id).await.unwrap());
    assert!(store.binding_exists(audit.id, orders.id).await.unwrap());

    let err = store.create_binding(audit.id, orders.id).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(store.list_bindings(s.id).await.unwrap(), vec![binding]);
}

#[tokio::test]
async fn test_binding_to_unknown_resource_is_not_found() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let s = server(&store, p.id, "broker").await;
    let orders = topic(&store, &s, "orders").await;

    let err = store
        .create_binding(orders.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_schema_versions_increase_by_one() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;

    let schema = store.create_schema(new_schema(p.id, "Order")).await.unwrap();
    assert_eq!(schema.version, 1);

    let editor = Uuid::new_v4();
    let updated = store
        .create_schema_version(schema.id, SCHEMA_V2.to_string(), editor)
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.schema, SCHEMA_V2);

    let versions = store.list_schema_versions(schema.id).await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(versions[0].schema, SCHEMA_V1);
    assert_eq!(versions[1].created_by, editor);

    // The head always mirrors the newest history row
    let head = store.get_schema(schema.id).await.unwrap().unwrap();
    assert_eq!(head.version, 2);
    assert_eq!(head.schema, versions[1].schema);
}

#[tokio::test]
async fn test_new_version_of_unknown_schema_is_not_found() {
    let store = MemoryStorageBackend::new();
    let err = store
        .create_schema_version(Uuid::new_v4(), SCHEMA_V2.to_string(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_schema_in_deleted_project_is_rejected() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Gone").await;
    store.delete_project(p.id).await.unwrap();

    let err = store.create_schema(new_schema(p.id, "Order")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_messages_stay_pinned_to_their_version() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let schema = store.create_schema(new_schema(p.id, "Order")).await.unwrap();

    let message = store
        .create_message(NewMessage {
            project_id: p.id,
            name: "order_created".to_string(),
            description: String::new(),
            schema_id: schema.id,
            schema_version: 1,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    store
        .create_schema_version(schema.id, SCHEMA_V2.to_string(), Uuid::new_v4())
        .await
        .unwrap();

    let reloaded = store.get_message(message.id).await.unwrap().unwrap();
    assert_eq!(reloaded.schema_version, 1);
}

#[tokio::test]
async fn test_message_needs_an_existing_version() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let schema = store.create_schema(new_schema(p.id, "Order")).await.unwrap();

    let err = store
        .create_message(NewMessage {
            project_id: p.id,
            name: "order_created".to_string(),
            description: String::new(),
            schema_id: schema.id,
            schema_version: 3,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_app_links_are_unique_per_direction() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let s = server(&store, p.id, "broker").await;
    let orders = topic(&store, &s, "orders").await;
    let schema = store.create_schema(new_schema(p.id, "Order")).await.unwrap();
    let message = store
        .create_message(NewMessage {
            project_id: p.id,
            name: "order_created".to_string(),
            description: String::new(),
            schema_id: schema.id,
            schema_version: 1,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let app = store
        .create_app(NewApp {
            project_id: p.id,
            name: "checkout".to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let link = |direction| NewAppResourceMessage {
        app_id: app.id,
        resource_id: orders.id,
        message_id: message.id,
        direction,
        created_by: app.created_by,
    };

    store
        .create_app_resource_message(link(Direction::Sends))
        .await
        .unwrap();
    // The same message may also be received through the same resource
    store
        .create_app_resource_message(link(Direction::Receives))
        .await
        .unwrap();

    let err = store
        .create_app_resource_message(link(Direction::Sends))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(
        store
            .app_resource_message_exists(app.id, orders.id, message.id, Direction::Sends)
            .await
            .unwrap()
    );
    let links = store.list_app_resource_messages(app.id).await.unwrap();
    let directions: Vec<Direction> = links.iter().map(|l| l.direction).collect();
    assert_eq!(directions, vec![Direction::Sends, Direction::Receives]);
}

#[tokio::test]
async fn test_names_are_trimmed_before_checks() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Shop").await;
    let s = server(&store, p.id, "  broker ").await;

    assert_eq!(s.name, "broker");
    assert!(store.server_name_exists(p.id, "broker").await.unwrap());
}

#[tokio::test]
async fn test_server_in_deleted_project_is_rejected() {
    let store = MemoryStorageBackend::new();
    let p = project(&store, "Gone").await;
    store.delete_project(p.id).await.unwrap();

    let err = store
        .create_server(NewServer {
            project_id: p.id,
            name: "broker".to_string(),
            description: String::new(),
            protocol: Protocol::Kafka,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
    assert!(store.list_servers(p.id).await.unwrap().is_empty());
}
