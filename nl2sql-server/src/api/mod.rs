//! HTTP API
//!
//! Endpoints:
//! - `GET /health` - database and oracle connectivity
//! - `GET /schema` - tables, columns and sample rows
//! - `GET /models` - models the oracle can serve
//! - `POST /nl2sql` - question to validated SQL
//! - `POST /query` - question to SQL to rows
//! - `POST /execute-sql` - validate and run caller-written SQL

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use nl2sql_core::Nl2SqlService;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;

/// State shared across handlers
pub type AppState = Arc<Nl2SqlService>;

/// Create the API router
pub fn create_router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/schema", get(routes::schema))
        .route("/models", get(routes::models))
        .route("/nl2sql", post(routes::nl2sql))
        .route("/query", post(routes::query))
        .route("/execute-sql", post(routes::execute_sql))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}
