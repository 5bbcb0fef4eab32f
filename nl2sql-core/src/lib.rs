//! NL2SQL Core - question in, validated SQL and bounded results out.
//!
//! Provides the request pipeline behind the NL2SQL service:
//! - Deterministic schema context rendering for the generation prompt
//! - Trait-based generation oracle (Ollama over HTTP, scripted mock)
//! - Lexical cleaning, validation and confidence scoring of generated SQL
//! - Row-capped, timed execution against a pluggable data store (SQLite)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Nl2SqlService               │
//! │   (generate_sql / run_query / health)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┼───────────────┐
//!      ▼           ▼               ▼
//! ┌──────────┐ ┌──────────┐ ┌─────────────┐
//! │SqlGener- │ │ sql::    │ │QueryExecutor│
//! │ator      │ │ clean/   │ │             │
//! │(LlmBack- │ │ validate/│ │ (DataStore: │
//! │ end)     │ │ score    │ │  SQLite)    │
//! └──────────┘ └──────────┘ └─────────────┘
//! ```
//!
//! Every stage runs sequentially within one request. Nothing here holds
//! mutable state shared between requests, so a single service value can be
//! used from many tasks at once.

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod present;
pub mod prompt;
pub mod schema;
pub mod service;
pub mod sql;
pub mod store;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use backend::{MockBackend, OllamaBackend};
pub use config::{OllamaConfig, PipelineConfig};
pub use error::{ErrorKind, PipelineError, Stage};
pub use executor::{ExecutionOutcome, QueryExecutor};
pub use generator::SqlGenerator;
pub use schema::{build_context, ColumnDescriptor, Row, SchemaSnapshot, TableDescriptor};
pub use service::{
    ExecuteSqlResponse, GenerateSqlResponse, HealthReport, HealthStatus, Nl2SqlService,
    RunQueryResponse, SchemaReport,
};
pub use sql::{clean, score, validate, ValidatedQuery, ValidationReport};
pub use store::{DataStore, SqliteStore, StatementResult, StoreError};
