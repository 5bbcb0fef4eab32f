//! API route handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use nl2sql_core::present::{estimate_complexity, extract_table_names, format_query_results, format_sql};
use nl2sql_core::{HealthReport, Row, SchemaReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct Nl2SqlRequest {
    pub question: String,
    #[serde(default)]
    pub schema_context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Nl2SqlResponse {
    pub question: String,
    pub sql_query: String,
    pub formatted_sql: String,
    /// "Simple", "Moderate" or "Complex"
    pub complexity: String,
    /// Tables named after FROM or JOIN
    pub tables: Vec<String>,
    pub explanation: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub schema_context: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub sql_query: String,
    pub results: Vec<Row>,
    pub row_count: u64,
    pub execution_time: f64,
    pub explanation: String,
    pub warnings: Vec<String>,
}

/// Accepted as query parameters or as a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteSqlParams {
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `{"success": true, "message", "data", "timestamp"}`
fn success_envelope(data: Value, message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /health
pub async fn health(State(service): State<AppState>) -> Json<HealthReport> {
    Json(service.health().await)
}

/// GET /schema
pub async fn schema(State(service): State<AppState>) -> Result<Json<SchemaReport>, ApiError> {
    service.schema().await.map(Json).map_err(|e| {
        warn!(error = %e, "Failed to get schema");
        ApiError::from_pipeline(Some(e.kind()), Some(e.to_string()))
    })
}

/// GET /models
pub async fn models(State(service): State<AppState>) -> Json<Value> {
    let models = service.available_models().await;
    info!(count = models.len(), "Listed models");
    success_envelope(json!({ "models": models }), "Success")
}

/// POST /nl2sql
pub async fn nl2sql(
    State(service): State<AppState>,
    Json(request): Json<Nl2SqlRequest>,
) -> Result<Json<Nl2SqlResponse>, ApiError> {
    let outcome = service
        .generate_sql(&request.question, request.schema_context.as_deref())
        .await;

    if !outcome.success {
        return Err(ApiError::from_pipeline(outcome.error_kind, outcome.error));
    }

    Ok(Json(Nl2SqlResponse {
        formatted_sql: format_sql(&outcome.sql_query),
        complexity: estimate_complexity(&outcome.sql_query).to_string(),
        tables: extract_table_names(&outcome.sql_query),
        question: outcome.question,
        sql_query: outcome.sql_query,
        explanation: outcome.explanation,
        confidence: outcome.confidence,
        warnings: outcome.warnings,
    }))
}

/// POST /query
pub async fn query(
    State(service): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let outcome = service
        .run_query(
            &request.question,
            request.schema_context.as_deref(),
            request.limit,
        )
        .await;

    if !outcome.success {
        return Err(ApiError::from_pipeline(outcome.error_kind, outcome.error));
    }

    Ok(Json(QueryResponse {
        results: format_query_results(&outcome.results),
        question: outcome.question,
        sql_query: outcome.sql_query,
        row_count: outcome.row_count,
        execution_time: outcome.execution_time,
        explanation: outcome.explanation,
        warnings: outcome.warnings,
    }))
}

/// POST /execute-sql
///
/// Query parameters take precedence over the body.
pub async fn execute_sql(
    State(service): State<AppState>,
    Query(params): Query<ExecuteSqlParams>,
    body: Option<Json<ExecuteSqlParams>>,
) -> Result<Json<Value>, ApiError> {
    let request = match (params.sql_query.is_some(), body) {
        (false, Some(Json(body))) => body,
        _ => params,
    };
    let Some(sql_query) = request.sql_query else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "sql_query is required",
            "validation_error",
        ));
    };

    let outcome = service.execute_sql(&sql_query, request.limit).await;

    if !outcome.success {
        return Err(ApiError::from_pipeline(outcome.error_kind, outcome.error));
    }

    Ok(success_envelope(
        json!({
            "sql_query": outcome.sql_query,
            "results": format_query_results(&outcome.results),
            "row_count": outcome.row_count,
            "execution_time": outcome.execution_time,
            "summary": outcome.summary,
            "warnings": outcome.warnings,
        }),
        "Success",
    ))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
