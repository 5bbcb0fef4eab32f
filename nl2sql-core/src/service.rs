//! Nl2SqlService - main entry point for the question-to-results pipeline.
//!
//! Every public operation returns an outcome value with `success` and
//! `error` fields instead of an `Err`, so callers can branch on the result
//! without unpacking a failure type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::traits::LlmBackend;
use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError};
use crate::executor::QueryExecutor;
use crate::generator::SqlGenerator;
use crate::present::result_summary;
use crate::schema::{build_context, Row, SchemaSnapshot, TableDescriptor};
use crate::sql::{clean, score, validate, validate_query};
use crate::store::DataStore;

/// Outcome of translating a question into SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSqlResponse {
    pub question: String,
    /// Cleaned SQL; the rejected candidate on validation failure, empty if generation failed
    pub sql_query: String,
    pub explanation: String,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

/// Outcome of answering a question end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunQueryResponse {
    pub question: String,
    /// Statement as executed, including any appended row ceiling
    pub sql_query: String,
    pub results: Vec<Row>,
    pub row_count: u64,
    pub execution_time: f64,
    pub explanation: String,
    pub warnings: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

/// Outcome of running caller-supplied SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteSqlResponse {
    pub sql_query: String,
    pub results: Vec<Row>,
    pub row_count: u64,
    pub execution_time: f64,
    pub summary: String,
    pub warnings: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Connectivity of both collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub database_connected: bool,
    pub ollama_connected: bool,
    /// RFC 3339
    pub timestamp: String,
}

/// Schema listing as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub tables: Vec<TableDescriptor>,
    pub total_tables: usize,
}

/// A question that made it through generation, cleaning and validation.
struct Generation {
    sql: String,
    warnings: Vec<String>,
    explanation: String,
    confidence: f64,
}

/// A failed stage, with whatever SQL existed when it failed.
struct StageFailure {
    error: PipelineError,
    sql_query: String,
}

impl From<PipelineError> for StageFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            sql_query: String::new(),
        }
    }
}

/// Main entry point for the pipeline.
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct Nl2SqlService {
    generator: SqlGenerator,
    executor: QueryExecutor,
    config: PipelineConfig,
}

impl Nl2SqlService {
    /// Create a service over one oracle and one data store.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn DataStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator: SqlGenerator::new(backend, config.generation_timeout),
            executor: QueryExecutor::new(store, config.execution_timeout),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read a fresh snapshot from the store.
    pub async fn schema_snapshot(&self) -> Result<SchemaSnapshot, PipelineError> {
        let store = Arc::clone(self.executor.store());
        let sample_rows = self.config.inspected_sample_rows;
        tokio::task::spawn_blocking(move || store.inspect_schema(sample_rows))
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?
            .map_err(PipelineError::from)
    }

    /// Render the current schema as prompt context.
    pub async fn schema_context(&self) -> Result<String, PipelineError> {
        Ok(build_context(&self.schema_snapshot().await?))
    }

    /// Describe every table in the store.
    pub async fn schema(&self) -> Result<SchemaReport, PipelineError> {
        let snapshot = self.schema_snapshot().await?;
        info!(tables = snapshot.tables.len(), "Retrieved schema");
        Ok(SchemaReport {
            total_tables: snapshot.tables.len(),
            tables: snapshot.tables,
        })
    }

    /// Translate a question into validated SQL with an explanation.
    ///
    /// `schema_context` is synthesised from the store when absent or blank.
    #[tracing::instrument(
        skip(self, question, schema_context),
        fields(request_id = %uuid::Uuid::new_v4(), question_len = question.len())
    )]
    pub async fn generate_sql(
        &self,
        question: &str,
        schema_context: Option<&str>,
    ) -> GenerateSqlResponse {
        match self.generate(question, schema_context).await {
            Ok(generation) => GenerateSqlResponse {
                question: question.to_string(),
                sql_query: generation.sql,
                explanation: generation.explanation,
                confidence: generation.confidence,
                warnings: generation.warnings,
                success: true,
                error: None,
                error_kind: None,
            },
            Err(failure) => GenerateSqlResponse {
                question: question.to_string(),
                sql_query: failure.sql_query,
                explanation: String::new(),
                confidence: 0.0,
                warnings: Vec::new(),
                success: false,
                error: Some(failure.error.to_string()),
                error_kind: Some(failure.error.kind()),
            },
        }
    }

    /// Translate a question, then execute the SQL under the row ceiling.
    ///
    /// `limit` defaults to the configured row limit.
    #[tracing::instrument(
        skip(self, question, schema_context),
        fields(request_id = %uuid::Uuid::new_v4(), question_len = question.len())
    )]
    pub async fn run_query(
        &self,
        question: &str,
        schema_context: Option<&str>,
        limit: Option<u32>,
    ) -> RunQueryResponse {
        let generation = match self.generate(question, schema_context).await {
            Ok(generation) => generation,
            Err(failure) => {
                return RunQueryResponse {
                    question: question.to_string(),
                    sql_query: failure.sql_query,
                    results: Vec::new(),
                    row_count: 0,
                    execution_time: 0.0,
                    explanation: String::new(),
                    warnings: Vec::new(),
                    success: false,
                    error: Some(failure.error.to_string()),
                    error_kind: Some(failure.error.kind()),
                };
            }
        };

        let row_limit = limit.unwrap_or(self.config.default_row_limit);
        info!(row_limit, "Executing generated SQL");
        let outcome = self.executor.execute(&generation.sql, row_limit).await;
        let error = outcome.to_error(self.executor.timeout());

        if let Some(e) = &error {
            warn!(error = %e, "Generated SQL failed to execute");
        } else {
            info!(
                row_count = outcome.row_count,
                elapsed = outcome.elapsed_seconds,
                "Query executed successfully"
            );
        }

        RunQueryResponse {
            question: question.to_string(),
            sql_query: outcome.executed_sql,
            results: outcome.rows,
            row_count: outcome.row_count,
            execution_time: outcome.elapsed_seconds,
            explanation: generation.explanation,
            warnings: generation.warnings,
            success: outcome.succeeded,
            error_kind: error.as_ref().map(PipelineError::kind),
            error: error.map(|e| e.to_string()),
        }
    }

    /// Validate and execute caller-written SQL. No cleaning, no oracle.
    #[tracing::instrument(skip(self, sql), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn execute_sql(&self, sql: &str, limit: Option<u32>) -> ExecuteSqlResponse {
        let report = validate(sql);
        if !report.is_valid {
            warn!(errors = ?report.errors, "Rejected SQL");
            return ExecuteSqlResponse {
                sql_query: sql.to_string(),
                results: Vec::new(),
                row_count: 0,
                execution_time: 0.0,
                summary: String::new(),
                warnings: report.warnings,
                success: false,
                error: Some(format!("SQL syntax errors: {}", report.errors.join(", "))),
                error_kind: Some(ErrorKind::Validation),
            };
        }

        let row_limit = limit.unwrap_or(self.config.default_row_limit);
        let outcome = self.executor.execute(sql, row_limit).await;
        let error = outcome.to_error(self.executor.timeout());
        let summary = if outcome.succeeded {
            result_summary(&outcome.rows, outcome.elapsed_seconds)
        } else {
            String::new()
        };

        ExecuteSqlResponse {
            sql_query: sql.to_string(),
            results: outcome.rows,
            row_count: outcome.row_count,
            execution_time: outcome.elapsed_seconds,
            summary,
            warnings: report.warnings,
            success: outcome.succeeded,
            error_kind: error.as_ref().map(PipelineError::kind),
            error: error.map(|e| e.to_string()),
        }
    }

    /// Probe the store and the oracle.
    pub async fn health(&self) -> HealthReport {
        let store = Arc::clone(self.executor.store());
        let database_connected = tokio::task::spawn_blocking(move || store.ping())
            .await
            .unwrap_or(false);
        let ollama_connected = self.generator.backend().is_available().await;

        let status = if database_connected && ollama_connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        info!(?status, database_connected, ollama_connected, "Health check");

        HealthReport {
            status,
            database_connected,
            ollama_connected,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Models the oracle can serve. Empty when it cannot be reached.
    pub async fn available_models(&self) -> Vec<String> {
        match self.generator.backend().list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "Could not list models");
                Vec::new()
            }
        }
    }

    async fn resolve_context(&self, supplied: Option<&str>) -> Result<String, PipelineError> {
        match supplied {
            Some(context) if !context.trim().is_empty() => Ok(context.to_string()),
            _ => {
                debug!("No schema context supplied, reading it from the store");
                self.schema_context().await
            }
        }
    }

    async fn generate(
        &self,
        question: &str,
        schema_context: Option<&str>,
    ) -> Result<Generation, StageFailure> {
        let context = self.resolve_context(schema_context).await?;

        info!("Generating SQL");
        let raw = self.generator.generate_sql(question, &context).await?;
        let candidate = clean(&raw);
        debug!(sql = %candidate, "Cleaned candidate SQL");

        let validated = validate_query(&candidate).map_err(|error| {
            warn!(error = %error, "Candidate SQL rejected");
            StageFailure {
                error,
                sql_query: candidate.clone(),
            }
        })?;
        for warning in validated.warnings() {
            warn!(%warning, "Validation warning");
        }

        let explanation = self
            .generator
            .generate_explanation(validated.sql(), question)
            .await
            .map_err(|error| StageFailure {
                error,
                sql_query: validated.sql().to_string(),
            })?;

        let confidence = score(validated.sql(), &context);
        let (sql, warnings) = validated.into_parts();

        Ok(Generation {
            sql,
            warnings,
            explanation: explanation.trim().to_string(),
            confidence,
        })
    }
}
