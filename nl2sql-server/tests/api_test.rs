//! HTTP API tests driven through the router with `oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use nl2sql_core::store::seed_sample_data;
use nl2sql_core::{MockBackend, Nl2SqlService, PipelineConfig, SqliteStore};
use nl2sql_server::api::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(backend: MockBackend) -> Router {
    let store = SqliteStore::open_in_memory().unwrap();
    seed_sample_data(&store).unwrap();
    let service = Nl2SqlService::new(Arc::new(backend), Arc::new(store), PipelineConfig::default());
    create_router(Arc::new(service))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_always_reports() {
    let (status, body) = send(app(MockBackend::default().with_available(false)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database_connected"], true);
    assert_eq!(body["ollama_connected"], false);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_schema_lists_tables() {
    let (status, body) = send(app(MockBackend::default()), get("/schema")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_tables"], 3);
    let customers = &body["tables"][0];
    assert_eq!(customers["table_name"], "customers");
    assert_eq!(customers["columns"][0], json!({"name": "id", "type": "INTEGER", "nullable": true, "primary_key": true}));
    assert_eq!(customers["sample_data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_models_envelope() {
    let backend = MockBackend::new("llama2").with_models(["llama2", "mistral"]);
    let (status, body) = send(app(backend), get("/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["models"], json!(["llama2", "mistral"]));
}

#[tokio::test]
async fn test_nl2sql_success() {
    let backend = MockBackend::default().with_script([
        "select name from customers where state = 'CA'",
        "Names of customers in California.",
    ]);
    let (status, body) = send(app(backend), post("/nl2sql", json!({"question": "Who is in CA?"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "Who is in CA?");
    assert_eq!(body["sql_query"], "select name from customers where state = 'CA'");
    assert_eq!(body["formatted_sql"], "SELECT name\nFROM customers\nWHERE state = 'CA'");
    assert_eq!(body["complexity"], "Simple");
    assert_eq!(body["tables"], json!(["customers"]));
    assert_eq!(body["explanation"], "Names of customers in California.");
    assert!(body["confidence"].as_f64().unwrap() >= 0.5);
}

#[tokio::test]
async fn test_nl2sql_validation_failure_is_400() {
    let backend = MockBackend::default().with_response("INVALID SQL QUERY");
    let (status, body) = send(app(backend), post("/nl2sql", json!({"question": "?"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "validation_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Generated SQL has syntax errors: "));
}

#[tokio::test]
async fn test_nl2sql_oracle_failure_is_500() {
    let backend = MockBackend::default().with_failure(500, "boom");
    let (status, body) = send(app(backend), post("/nl2sql", json!({"question": "?"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "generation_error");
}

#[tokio::test]
async fn test_query_returns_formatted_rows() {
    let backend = MockBackend::default().with_script([
        "SELECT id, description FROM products WHERE id = 1",
        "The first product.",
    ]);
    let (status, body) = send(
        app(backend),
        post("/query", json!({"question": "first product", "limit": 10})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql_query"], "SELECT id, description FROM products WHERE id = 1 LIMIT 10");
    assert_eq!(body["row_count"], 1);
    assert_eq!(body["results"], json!([{"id": 1, "description": "High-performance laptop"}]));
}

#[tokio::test]
async fn test_query_execution_failure_is_400() {
    let backend = MockBackend::default().with_script(["SELECT * FROM refunds", "All refunds."]);
    let (status, body) = send(app(backend), post("/query", json!({"question": "refunds"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "execution_error");
}

#[tokio::test]
async fn test_execute_sql_envelope() {
    let (status, body) = send(
        app(MockBackend::default()),
        post("/execute-sql", json!({"sql_query": "SELECT name FROM customers", "limit": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["row_count"], 2);
    assert_eq!(
        body["data"]["summary"].as_str().unwrap().split(" in ").next(),
        Some("Retrieved 2 rows with 1 column")
    );
}

#[tokio::test]
async fn test_execute_sql_rejects_invalid() {
    let (status, body) = send(
        app(MockBackend::default()),
        post("/execute-sql", json!({"sql_query": "SELECT 1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "SQL syntax errors: Query must contain FROM clause");
}

#[tokio::test]
async fn test_execute_sql_from_query_parameters() {
    let request = Request::builder()
        .method("POST")
        .uri("/execute-sql?sql_query=SELECT%20name%20FROM%20customers&limit=3")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(MockBackend::default()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sql_query"], "SELECT name FROM customers");
    assert_eq!(body["data"]["row_count"], 3);
}

#[tokio::test]
async fn test_execute_sql_without_statement_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/execute-sql")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(MockBackend::default()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "sql_query is required");
}

#[tokio::test]
async fn test_execute_sql_second_statement_is_400() {
    let (status, body) = send(
        app(MockBackend::default()),
        post(
            "/execute-sql",
            json!({"sql_query": "SELECT * FROM customers; SELECT 1 FROM orders", "limit": 2}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "execution_error");
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let (status, body) = send(app(MockBackend::default()), get("/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "not_found");
}
