//! End-to-end import pipeline over the in-memory store: parse, validate,
//! materialize, then read back through the store and the usage matrix.

use event_catalog_api::models::{Direction, NewProject, NewServer, Protocol};
use event_catalog_api::services::usage_service::usage_matrix;
use event_catalog_api::services::{
    ExportService, ImportError, ImportService, JsonSchemaCompiler, ResourceKey,
};
use event_catalog_api::storage::{MemoryStorageBackend, StorageBackend};
use std::sync::Arc;
use uuid::Uuid;

const CHECKOUT: &str = r#"
version: 1
servers:
  - name: kafka_server
    type: kafka
    resources:
      - name: orders
        mode: write
        type: topic
schemas:
  - name: Order
    type: jsonschema
    schema: '{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}'
messages:
  - name: order_created
    schema:
      name: Order
apps:
  - name: checkout
    sends:
      - message: order_created
        resource: async+kafka://kafka_server@write/topic/orders
"#;

async fn setup() -> (Arc<MemoryStorageBackend>, ImportService, Uuid) {
    let storage = Arc::new(MemoryStorageBackend::new());
    let project = storage
        .create_project(NewProject {
            name: "Shop".to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let service = ImportService::new(storage.clone(), Arc::new(JsonSchemaCompiler::new()));
    (storage, service, project.id)
}

#[tokio::test]
async fn test_checkout_document_imports_and_wires_the_app() {
    let (storage, service, project_id) = setup().await;
    let user = Uuid::new_v4();

    service.validate(CHECKOUT, project_id).await.unwrap();
    let report = service.import(CHECKOUT, project_id, user).await.unwrap();

    assert_eq!(report.servers, vec!["kafka_server"]);
    assert_eq!(
        report.resources,
        vec![ResourceKey::new("kafka_server", "orders")]
    );
    assert_eq!(report.bindings, 0);
    assert_eq!(report.schemas, vec!["Order"]);
    assert_eq!(report.messages, vec!["order_created"]);
    assert_eq!(report.apps, vec!["checkout"]);
    assert_eq!(report.links, 1);

    let apps = storage.list_apps(project_id).await.unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].name, "checkout");
    assert_eq!(apps[0].created_by, user);

    let matrix = usage_matrix(storage.as_ref(), apps[0].id).await.unwrap();
    assert_eq!(matrix.sends.len(), 1);
    assert!(matrix.receives.is_empty());
    assert_eq!(matrix.sends[0].message.name, "order_created");
    assert_eq!(matrix.sends[0].message.schema_version, 1);
    assert_eq!(matrix.sends[0].resource.name, "orders");
    assert_eq!(matrix.sends[0].server.name, "kafka_server");

    let links = storage.list_app_resource_messages(apps[0].id).await.unwrap();
    assert_eq!(links[0].direction, Direction::Sends);
}

#[tokio::test]
async fn test_invalid_schema_blocks_the_whole_import() {
    let (storage, service, project_id) = setup().await;
    let document = CHECKOUT.replace(
        r#"'{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}'"#,
        "'{not json'",
    );

    let err = service
        .import(&document, project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    let ImportError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert!(errors.iter().any(|e| e.contains("Order")));

    assert!(storage.list_servers(project_id).await.unwrap().is_empty());
    assert!(storage.list_schemas(project_id).await.unwrap().is_empty());
    assert!(storage.list_messages(project_id).await.unwrap().is_empty());
    assert!(storage.list_apps(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_is_repeatable_and_never_writes() {
    let (storage, service, project_id) = setup().await;
    let document = CHECKOUT.replace("message: order_created", "message: order_shipped");

    let first = service.validate(&document, project_id).await.unwrap_err();
    let second = service.validate(&document, project_id).await.unwrap_err();
    let (ImportError::Validation(first), ImportError::Validation(second)) = (first, second) else {
        panic!("expected validation errors");
    };

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec!["message 'order_shipped' referenced in app 'checkout' send not found".to_string()]
    );
    assert!(storage.list_servers(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_import_of_same_document_conflicts_on_every_name() {
    let (_storage, service, project_id) = setup().await;
    service
        .import(CHECKOUT, project_id, Uuid::new_v4())
        .await
        .unwrap();

    let err = service
        .import(CHECKOUT, project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    let ImportError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert_eq!(
        errors,
        vec![
            "server name 'kafka_server' already exists in the project".to_string(),
            "schema name 'Order' already exists in the project".to_string(),
            "message name 'order_created' already exists in the project".to_string(),
            "app name 'checkout' already exists in the project".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_malformed_text_is_rejected_before_validation() {
    let (_storage, service, project_id) = setup().await;

    let err = service
        .validate("servers: {name: [", project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Malformed(_)));

    let err = service
        .import("servers: not-a-list", project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Malformed(_)));
}

#[tokio::test]
async fn test_binds_and_receivers_are_materialized() {
    let (storage, service, project_id) = setup().await;
    let document = r#"
version: 1
servers:
  - name: broker
    type: amqp
    binds:
      - source: orders
        target: orders.audit
    resources:
      - name: orders
        mode: readwrite
        type: exchange
      - name: orders.audit
        mode: read
        type: queue
schemas:
  - name: Order
    type: jsonschema
    schema: '{"type": "object"}'
messages:
  - name: order_created
    schema:
      name: Order
apps:
  - name: shop.api
    sends:
      - message: order_created
        resource: amqp://broker@readwrite/exchange/orders
  - name: auditor
    receives:
      - message: order_created
        resource: async+amqp://broker@read/queue/orders.audit
"#;

    let report = service
        .import(document, project_id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(report.bindings, 1);
    assert_eq!(report.links, 2);

    let servers = storage.list_servers(project_id).await.unwrap();
    let bindings = storage.list_bindings(servers[0].id).await.unwrap();
    assert_eq!(bindings.len(), 1);

    let apps = storage.list_apps(project_id).await.unwrap();
    let auditor = apps.iter().find(|a| a.name == "auditor").unwrap();
    let matrix = usage_matrix(storage.as_ref(), auditor.id).await.unwrap();
    assert!(matrix.sends.is_empty());
    assert_eq!(matrix.receives[0].resource.name, "orders.audit");
}

#[tokio::test]
async fn test_export_of_imported_project_validates_in_a_fresh_project() {
    let (storage, service, project_id) = setup().await;
    service
        .import(CHECKOUT, project_id, Uuid::new_v4())
        .await
        .unwrap();

    let exported = ExportService::new(storage.clone())
        .export_project(project_id)
        .await
        .unwrap();
    let text = exported.to_yaml().unwrap();

    let other = storage
        .create_project(NewProject {
            name: "Mirror".to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    service.validate(&text, other.id).await.unwrap();
}

#[tokio::test]
async fn test_names_differing_only_in_whitespace_are_caught_before_import() {
    let (storage, service, project_id) = setup().await;
    let document = CHECKOUT.replace(
        "messages:",
        "  - name: \"Order \"\n    type: jsonschema\n    schema: '{\"type\": \"object\"}'\nmessages:",
    );

    let err = service
        .import(&document, project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    let ImportError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert_eq!(
        errors,
        vec!["schema 'Order' is declared more than once in the document".to_string()]
    );
    assert!(storage.list_servers(project_id).await.unwrap().is_empty());
    assert!(storage.list_schemas(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_server_name_is_required() {
    let (storage, service, project_id) = setup().await;
    let document = CHECKOUT.replace("name: kafka_server", "name: \"  \"");

    let err = service
        .import(&document, project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    let ImportError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert_eq!(errors, vec!["server name is required".to_string()]);
    assert!(storage.list_servers(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_padded_name_collides_with_existing_server() {
    let (storage, service, project_id) = setup().await;
    storage
        .create_server(NewServer {
            project_id,
            name: "kafka_server".to_string(),
            description: String::new(),
            protocol: Protocol::Kafka,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let document = CHECKOUT.replace("name: kafka_server", "name: \"kafka_server \"");

    let err = service.validate(&document, project_id).await.unwrap_err();
    let ImportError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert_eq!(
        errors,
        vec!["server name 'kafka_server' already exists in the project".to_string()]
    );
}

#[tokio::test]
async fn test_padded_references_import_cleanly() {
    let (storage, service, project_id) = setup().await;
    let document = CHECKOUT
        .replace("      name: Order\n", "      name: \"Order \"\n")
        .replace("message: order_created", "message: \" order_created\"");

    let report = service
        .import(&document, project_id, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(report.messages, vec!["order_created"]);
    assert_eq!(report.links, 1);

    let apps = storage.list_apps(project_id).await.unwrap();
    let matrix = usage_matrix(storage.as_ref(), apps[0].id).await.unwrap();
    assert_eq!(matrix.sends[0].message.name, "order_created");
}
