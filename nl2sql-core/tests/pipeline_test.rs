//! End-to-end pipeline tests against real SQLite and a scripted or HTTP oracle.

use std::sync::Arc;
use std::time::Duration;

use nl2sql_core::{
    build_context, ErrorKind, MockBackend, Nl2SqlService, OllamaBackend, OllamaConfig,
    PipelineConfig, SqliteStore,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn customers_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT, email TEXT, city TEXT, state TEXT);
             INSERT INTO customers VALUES (1, 'John Smith', 'john@example.com', 'New York', 'NY');
             INSERT INTO customers VALUES (2, 'Jane Doe', 'jane@example.com', 'Los Angeles', 'CA');
             INSERT INTO customers VALUES (3, 'Bob Johnson', 'bob@example.com', 'Chicago', 'IL');
             INSERT INTO customers VALUES (4, 'Alice Brown', 'alice@example.com', 'Houston', 'TX');
             INSERT INTO customers VALUES (5, 'Charlie Wilson', 'charlie@example.com', 'Phoenix', 'AZ');",
        )
        .unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn test_question_to_rows() {
    let backend = Arc::new(MockBackend::default().with_script([
        "```sql\nSELECT * FROM customers WHERE city = 'New York'\n```",
        "Finds customers who live in New York.",
    ]));
    let service = Nl2SqlService::new(backend.clone(), customers_store(), PipelineConfig::default());

    let response = service
        .run_query("Which customers live in New York?", None, None)
        .await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(
        response.sql_query,
        "SELECT * FROM customers WHERE city = 'New York' LIMIT 100"
    );
    assert_eq!(response.row_count, 1);
    assert_eq!(response.results[0]["name"], json!("John Smith"));
    assert_eq!(response.explanation, "Finds customers who live in New York.");
    assert_eq!(
        response.warnings,
        vec![
            "Consider adding LIMIT clause for large datasets",
            "Consider selecting specific columns instead of *",
        ]
    );

    // Context was synthesised from the store, explanation saw the cleaned SQL
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Table: customers"));
    assert!(prompts[0].contains("  - id (INTEGER) [PRIMARY KEY]"));
    assert!(prompts[1].contains("SQL Query: SELECT * FROM customers WHERE city = 'New York'\n"));
}

#[tokio::test]
async fn test_oracle_http_500_fails_generation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&OllamaConfig::new(server.uri(), "llama2")).unwrap();
    let service = Nl2SqlService::new(Arc::new(backend), customers_store(), PipelineConfig::default());

    let response = service.generate_sql("How many customers?", None).await;

    assert!(!response.success);
    assert_eq!(response.sql_query, "");
    assert_eq!(response.error_kind, Some(ErrorKind::Generation));
    assert!(!response.error.unwrap().is_empty());
}

#[tokio::test]
async fn test_oracle_timeout_is_distinct_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "SELECT 1 FROM customers"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&OllamaConfig::new(server.uri(), "llama2")).unwrap();
    let config = PipelineConfig {
        generation_timeout: Duration::from_millis(50),
        ..PipelineConfig::default()
    };
    let service = Nl2SqlService::new(Arc::new(backend), customers_store(), config);

    let response = service.generate_sql("How many customers?", None).await;

    assert!(!response.success);
    assert_eq!(response.error_kind, Some(ErrorKind::Timeout));
    assert!(response.error.unwrap().starts_with("SQL generation timed out"));
}

#[tokio::test]
async fn test_dangerous_sql_never_reaches_store() {
    let backend = Arc::new(
        MockBackend::default().with_response("SELECT * FROM customers; DROP TABLE customers"),
    );
    let store = customers_store();
    let service = Nl2SqlService::new(backend.clone(), store.clone(), PipelineConfig::default());

    let response = service.run_query("drop everything", None, None).await;

    assert!(!response.success);
    assert_eq!(response.error_kind, Some(ErrorKind::Validation));
    assert_eq!(backend.call_count(), 1);

    let snapshot = service.schema_snapshot().await.unwrap();
    assert_eq!(snapshot.table_names(), vec!["customers"]);
    assert_eq!(snapshot.table("customers").unwrap().sample_rows.len(), 3);
}

#[tokio::test]
async fn test_schema_context_is_deterministic() {
    let backend = Arc::new(MockBackend::default());
    let service = Nl2SqlService::new(backend, customers_store(), PipelineConfig::default());

    let first = service.schema_context().await.unwrap();
    let second = service.schema_context().await.unwrap();
    assert_eq!(first, second);

    let snapshot = service.schema_snapshot().await.unwrap();
    assert_eq!(build_context(&snapshot), first);
    assert!(first.starts_with("Database Schema:\n\nTable: customers\n"));
}
