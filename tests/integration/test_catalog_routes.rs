//! Entity endpoints: projects, servers, resources, binds, schemas, messages
//! and apps.

use axum::http::StatusCode;
use axum_test::TestServer;
use event_catalog_api::routes::{AppState, create_api_router};
use event_catalog_api::services::JwtService;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "catalog-route-tests-secret-0123456789abcdef";
const SCHEMA_V1: &str = r#"{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}"#;
const SCHEMA_V2: &str = r#"{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object", "required": ["id"]}"#;
const SCHEMA_V3: &str = r#"{"$schema": "http://json-schema.org/draft-07/schema#", "type": "object", "required": ["id", "total"]}"#;

struct Client {
    server: TestServer,
    token: String,
}

impl Client {
    fn new() -> Self {
        let jwt = JwtService::new(SECRET);
        let token = jwt
            .generate_token_pair(Uuid::new_v4(), "catalog-tests")
            .unwrap()
            .access_token;
        let state = AppState::new(jwt);
        let router = create_api_router(state.clone()).with_state(state);
        Self {
            server: TestServer::new(router).unwrap(),
            token,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.server.get(path).authorization_bearer(&self.token).await;
        let status = response.status_code();
        let body = if response.text().is_empty() {
            Value::Null
        } else {
            response.json()
        };
        (status, body)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .server
            .post(path)
            .authorization_bearer(&self.token)
            .json(&body)
            .await;
        (response.status_code(), response.json())
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .server
            .put(path)
            .authorization_bearer(&self.token)
            .json(&body)
            .await;
        (response.status_code(), response.json())
    }

    async fn create(&self, path: &str, body: Value) -> String {
        let (status, body) = self.post(path, body).await;
        assert_eq!(status, StatusCode::CREATED, "{path}: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn project(&self, name: &str) -> String {
        self.create("/projects", json!({ "name": name })).await
    }
}

#[tokio::test]
async fn test_project_lifecycle() {
    let client = Client::new();
    let id = client.project("Shop").await;

    let (status, body) = client.post("/projects", json!({ "name": "Shop" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Shop"));

    let (status, body) = client.get(&format!("/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Shop");
    assert_eq!(body["status"], "active");

    let response = client
        .server
        .delete(&format!("/projects/{id}"))
        .authorization_bearer(&client.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (status, _) = client.get(&format!("/projects/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = client.get("/projects").await;
    assert!(list.as_array().unwrap().is_empty());

    // Soft-deleted names are reusable
    let reused = client.project("Shop").await;
    assert_ne!(reused, id);
}

#[tokio::test]
async fn test_project_name_rules() {
    let client = Client::new();

    let (status, body) = client.post("/projects", json!({ "name": "my-shop" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["field"], "name");

    let long = "a".repeat(46);
    let (status, _) = client.post("/projects", json!({ "name": long })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = client.post("/projects", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_servers_resources_and_binds() {
    let client = Client::new();
    let project = client.project("Shop").await;

    let (status, body) = client
        .post(
            &format!("/projects/{project}/servers"),
            json!({ "name": "broker", "protocol": "smtp" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["field"], "protocol");

    let broker = client
        .create(
            &format!("/projects/{project}/servers"),
            json!({ "name": "broker", "protocol": "kafka" }),
        )
        .await;
    let other = client
        .create(
            &format!("/projects/{project}/servers"),
            json!({ "name": "other.broker", "protocol": "amqp" }),
        )
        .await;

    let resource = |name: &str| json!({ "name": name, "mode": "readwrite", "resource_type": "topic" });
    let orders = client
        .create(&format!("/servers/{broker}/resources"), resource("orders"))
        .await;
    let audit = client
        .create(&format!("/servers/{broker}/resources"), resource("orders-audit"))
        .await;
    let elsewhere = client
        .create(&format!("/servers/{other}/resources"), resource("orders"))
        .await;

    let (status, _) = client
        .post(&format!("/servers/{broker}/resources"), resource("orders"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = client
        .post(
            &format!("/servers/{broker}/binds"),
            json!({ "source_resource_id": orders, "target_resource_id": audit }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source_resource_id"], orders.as_str());

    // Reversed direction is the same binding
    let (status, _) = client
        .post(
            &format!("/servers/{broker}/binds"),
            json!({ "source_resource_id": audit, "target_resource_id": orders }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client
        .post(
            &format!("/servers/{broker}/binds"),
            json!({ "source_resource_id": orders, "target_resource_id": elsewhere }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post(
            &format!("/servers/{broker}/binds"),
            json!({ "source_resource_id": orders, "target_resource_id": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, binds) = client.get(&format!("/servers/{broker}/binds")).await;
    assert_eq!(binds.as_array().unwrap().len(), 1);
    let (_, resources) = client.get(&format!("/servers/{broker}/resources")).await;
    assert_eq!(resources.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_schema_versions_are_monotonic_and_immutable() {
    let client = Client::new();
    let project = client.project("Shop").await;

    let (status, body) = client
        .post(
            &format!("/projects/{project}/schemas"),
            json!({ "name": "Order", "schema": r#"{"type": "object"}"# }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["field"], "schema");

    let schema = client
        .create(
            &format!("/projects/{project}/schemas"),
            json!({ "name": "Order", "schema": SCHEMA_V1 }),
        )
        .await;

    for (expected, text) in [(2, SCHEMA_V2), (3, SCHEMA_V3)] {
        let (status, body) = client
            .put(&format!("/schemas/{schema}"), json!({ "schema": text }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], expected);
    }

    let (_, versions) = client.get(&format!("/schemas/{schema}/versions")).await;
    let numbers: Vec<i64> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let (status, first) = client.get(&format!("/schemas/{schema}/versions/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["schema"], SCHEMA_V1);

    let (status, _) = client.get(&format!("/schemas/{schema}/versions/4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, head) = client.get(&format!("/schemas/{schema}")).await;
    assert_eq!(head["version"], 3);
    assert_eq!(head["type"], "jsonschema");

    let (status, _) = client
        .put(&format!("/schemas/{schema}"), json!({ "schema": "{broken" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_messages_stay_pinned_after_schema_edits() {
    let client = Client::new();
    let project = client.project("Shop").await;
    let schema = client
        .create(
            &format!("/projects/{project}/schemas"),
            json!({ "name": "Order", "schema": SCHEMA_V1 }),
        )
        .await;
    client
        .put(&format!("/schemas/{schema}"), json!({ "schema": SCHEMA_V2 }))
        .await;

    let message = json!({ "name": "order_created", "schema_id": schema, "schema_version": 2 });
    client
        .create(&format!("/projects/{project}/messages"), message)
        .await;

    let (status, _) = client
        .put(&format!("/schemas/{schema}"), json!({ "schema": SCHEMA_V3 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, messages) = client.get(&format!("/projects/{project}/messages")).await;
    assert_eq!(messages[0]["schema_id"], schema.as_str());
    assert_eq!(messages[0]["schema_version"], 2);

    let (status, _) = client
        .post(
            &format!("/projects/{project}/messages"),
            json!({ "name": "order_paid", "schema_id": schema, "schema_version": 9 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_message_schema_must_belong_to_the_project() {
    let client = Client::new();
    let home = client.project("Home").await;
    let away = client.project("Away").await;
    let schema = client
        .create(
            &format!("/projects/{away}/schemas"),
            json!({ "name": "Order", "schema": SCHEMA_V1 }),
        )
        .await;

    let (status, _) = client
        .post(
            &format!("/projects/{home}/messages"),
            json!({ "name": "order_created", "schema_id": schema, "schema_version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_app_connections_and_usage() {
    let client = Client::new();
    let project = client.project("Shop").await;
    let broker = client
        .create(
            &format!("/projects/{project}/servers"),
            json!({ "name": "broker", "protocol": "mqtt" }),
        )
        .await;
    let topic = client
        .create(
            &format!("/servers/{broker}/resources"),
            json!({ "name": "telemetry", "mode": "read", "resource_type": "topic" }),
        )
        .await;
    let schema = client
        .create(
            &format!("/projects/{project}/schemas"),
            json!({ "name": "Reading", "schema": SCHEMA_V1 }),
        )
        .await;
    let message = client
        .create(
            &format!("/projects/{project}/messages"),
            json!({ "name": "reading_taken", "schema_id": schema, "schema_version": 1 }),
        )
        .await;
    let app = client
        .create(
            &format!("/projects/{project}/apps"),
            json!({ "name": "dashboard.web" }),
        )
        .await;

    let connection = json!({ "resource_id": topic, "message_id": message, "direction": "receives" });
    let (status, body) = client
        .post(&format!("/apps/{app}/connections"), connection.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["direction"], "receives");

    let (status, _) = client
        .post(&format!("/apps/{app}/connections"), connection)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = client
        .post(
            &format!("/apps/{app}/connections"),
            json!({ "resource_id": topic, "message_id": message, "direction": "publishes" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["field"], "direction");

    let (status, usage) = client.get(&format!("/apps/{app}/usage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["app_id"], app.as_str());
    assert!(usage["sends"].as_array().unwrap().is_empty());
    let receives = usage["receives"].as_array().unwrap();
    assert_eq!(receives.len(), 1);
    assert_eq!(receives[0]["message"]["name"], "reading_taken");
    assert_eq!(receives[0]["resource"]["resource_type"], "topic");
    assert_eq!(receives[0]["server"]["name"], "broker");

    let (status, _) = client.get(&format!("/apps/{}/usage", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collections_of_unknown_project_are_not_found() {
    let client = Client::new();
    let missing = Uuid::new_v4();

    for collection in ["servers", "schemas", "messages", "apps"] {
        let (status, _) = client.get(&format!("/projects/{missing}/{collection}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{collection}");
    }
}
