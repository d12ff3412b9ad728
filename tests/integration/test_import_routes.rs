//! Import, validation and export endpoints.
//!
//! These tests drive the HTTP surface with the in-memory store:
//! - POST /projects/{id}/imports/validator
//! - POST /projects/{id}/imports
//! - GET /projects/{id}/exports

use axum::http::StatusCode;
use axum_test::TestServer;
use event_catalog_api::routes::{AppState, create_api_router};
use event_catalog_api::services::JwtService;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "import-route-tests-secret-0123456789abcdef";

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

const VALID_SCHEMA: &str =
    r#"'{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}'"#;

fn create_test_server() -> (TestServer, String) {
    let jwt = JwtService::new(SECRET);
    let token = jwt
        .generate_token_pair(Uuid::new_v4(), "import-tests")
        .unwrap()
        .access_token;
    let state = AppState::new(jwt);
    let router = create_api_router(state.clone()).with_state(state);
    (TestServer::new(router).unwrap(), token)
}

async fn create_project(server: &TestServer, token: &str, name: &str) -> String {
    let response = server
        .post("/projects")
        .authorization_bearer(token)
        .json(&json!({ "name": name }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn count(server: &TestServer, token: &str, path: &str) -> usize {
    let response = server.get(path).authorization_bearer(token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>().as_array().unwrap().len()
}

#[tokio::test]
async fn test_checkout_import_scenario() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;

    let response = server
        .post(&format!("/projects/{project_id}/imports/validator"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "message": "YAML is valid" }));

    let response = server
        .post(&format!("/projects/{project_id}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "Import completed successfully");
    assert_eq!(body["created"]["apps"], json!(["checkout"]));
    assert_eq!(
        body["created"]["resources"],
        json!([{ "server": "kafka_server", "resource": "orders" }])
    );
    assert_eq!(body["created"]["links"], 1);

    let response = server
        .get(&format!("/projects/{project_id}/apps"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let apps: Value = response.json();
    let apps = apps.as_array().unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["name"], "checkout");

    let app_id = apps[0]["id"].as_str().unwrap();
    let response = server
        .get(&format!("/apps/{app_id}/usage"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let usage: Value = response.json();
    assert_eq!(usage["sends"].as_array().unwrap().len(), 1);
    assert_eq!(usage["sends"][0]["message"]["name"], "order_created");
    assert_eq!(usage["sends"][0]["resource"]["mode"], "write");
    assert_eq!(usage["sends"][0]["server"]["protocol"], "kafka");
    assert!(usage["receives"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_schema_is_a_conflict_and_creates_nothing() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;
    let document = CHECKOUT.replace(VALID_SCHEMA, "'{\"type\": \"object\",'");

    let validation = server
        .post(&format!("/projects/{project_id}/imports/validator"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": document }))
        .await;
    assert_eq!(validation.status_code(), StatusCode::CONFLICT);
    let validation_errors = validation.json::<Value>()["errors"].clone();
    let errors = validation_errors.as_array().unwrap();
    assert!(!errors.is_empty());
    assert!(
        errors
            .iter()
            .any(|e| e.as_str().unwrap().contains("'Order'"))
    );

    let import = server
        .post(&format!("/projects/{project_id}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": document }))
        .await;
    assert_eq!(import.status_code(), StatusCode::CONFLICT);
    assert_eq!(import.json::<Value>()["errors"], validation_errors);

    for collection in ["servers", "schemas", "messages", "apps"] {
        let path = format!("/projects/{project_id}/{collection}");
        assert_eq!(count(&server, &token, &path).await, 0, "{collection}");
    }
}

#[tokio::test]
async fn test_duplicate_server_blocks_in_one_document() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;
    let document = r#"
version: 1
servers:
  - name: svc
    type: kafka
    resources: []
  - name: svc
    type: amqp
    resources: []
"#;

    let response = server
        .post(&format!("/projects/{project_id}/imports/validator"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": document }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "errors": ["server 'svc' is declared more than once in the document"] })
    );
}

#[tokio::test]
async fn test_existing_server_name_is_reported() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;

    let response = server
        .post(&format!("/projects/{project_id}/servers"))
        .authorization_bearer(&token)
        .json(&json!({ "name": "kafka_server", "protocol": "kafka" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .post(&format!("/projects/{project_id}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({ "errors": ["server name 'kafka_server' already exists in the project"] })
    );
    assert_eq!(
        count(&server, &token, &format!("/projects/{project_id}/apps")).await,
        0
    );
}

#[tokio::test]
async fn test_unknown_message_is_reported_and_nothing_is_imported() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;
    let document = CHECKOUT.replace("message: order_created", "message: order_cancelled");

    let response = server
        .post(&format!("/projects/{project_id}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": document }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    let error = errors[0].as_str().unwrap();
    assert!(error.contains("order_cancelled"));
    assert!(error.ends_with("not found"));

    assert_eq!(
        count(&server, &token, &format!("/projects/{project_id}/servers")).await,
        0
    );
}

#[tokio::test]
async fn test_validation_is_idempotent() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;
    let document = CHECKOUT
        .replace("type: kafka", "type: carrier-pigeon")
        .replace("mode: write", "mode: append");

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = server
            .post(&format!("/projects/{project_id}/imports/validator"))
            .authorization_bearer(&token)
            .json(&json!({ "yaml": document }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        bodies.push(response.json::<Value>());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert!(bodies[0]["errors"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_malformed_document_is_unprocessable() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;

    let response = server
        .post(&format!("/projects/{project_id}/imports/validator"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": "servers: {name: [" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"][0]["field"], "yaml");
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let (server, token) = create_test_server();
    let missing = Uuid::new_v4();

    let response = server
        .post(&format!("/projects/{missing}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post(&format!("/projects/{missing}/imports/validator"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_requires_a_token() {
    let (server, token) = create_test_server();
    let project_id = create_project(&server, &token, "Shop").await;

    let response = server
        .post(&format!("/projects/{project_id}/imports"))
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_export_reimports_into_an_empty_project() {
    let (server, token) = create_test_server();
    let source = create_project(&server, &token, "Source").await;
    let target = create_project(&server, &token, "Target").await;

    let response = server
        .post(&format!("/projects/{source}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": CHECKOUT }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/projects/{source}/exports"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let yaml = response.json::<Value>()["yaml"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(yaml.contains("kafka_server"));
    assert!(yaml.contains("async+kafka://kafka_server@write/topic/orders"));

    let response = server
        .post(&format!("/projects/{target}/imports"))
        .authorization_bearer(&token)
        .json(&json!({ "yaml": yaml }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        count(&server, &token, &format!("/projects/{target}/apps")).await,
        1
    );
}
