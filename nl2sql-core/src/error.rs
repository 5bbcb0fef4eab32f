//! Pipeline error taxonomy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::traits::LlmError;
use crate::store::StoreError;

/// Pipeline stage that can block and therefore time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SqlGeneration,
    Explanation,
    Execution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SqlGeneration => "SQL generation",
            Stage::Explanation => "explanation",
            Stage::Execution => "query execution",
        };
        f.write_str(name)
    }
}

/// Error types for one pass through the pipeline.
///
/// All variants are terminal for the request; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Oracle unreachable, non-success status or malformed response
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// Candidate SQL failed one or more lexical checks
    #[error("Generated SQL has syntax errors: {}", errors.join(", "))]
    Validation { errors: Vec<String> },

    /// Data store rejected or failed the statement
    #[error("Query execution failed: {0}")]
    Execution(String),

    /// Schema could not be read to build a context
    #[error("Failed to read schema: {0}")]
    Schema(#[from] StoreError),

    /// A blocking stage exceeded its time budget
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Generation,
    Validation,
    Execution,
    Schema,
    Timeout,
    Internal,
}

impl PipelineError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Generation(_) => ErrorKind::Generation,
            PipelineError::Validation { .. } => ErrorKind::Validation,
            PipelineError::Execution(_) => ErrorKind::Execution,
            PipelineError::Schema(_) => ErrorKind::Schema,
            PipelineError::Timeout { .. } => ErrorKind::Timeout,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Fold an oracle error into the pipeline taxonomy, keeping timeouts distinct.
    pub fn from_oracle(stage: Stage, error: LlmError) -> Self {
        match error {
            LlmError::Timeout(after) => PipelineError::Timeout { stage, after },
            other => PipelineError::Generation(other),
        }
    }
}
