//! Generation client: the two oracle calls of a request.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::traits::{CompletionRequest, LlmBackend};
use crate::error::{PipelineError, Stage};
use crate::prompt::{explanation_prompt, sql_generation_prompt, STOP_SEQUENCES};

/// Issues the SQL-generation and explanation prompts against one backend.
///
/// Each call is bounded by the configured timeout; a call that overruns
/// fails with [`PipelineError::Timeout`]. There is no retry.
#[derive(Clone)]
pub struct SqlGenerator {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl SqlGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend(&self) -> &Arc<dyn LlmBackend> {
        &self.backend
    }

    /// Ask the oracle for SQL answering `question`. Returns the raw text.
    pub async fn generate_sql(
        &self,
        question: &str,
        schema_context: &str,
    ) -> Result<String, PipelineError> {
        if schema_context.trim().is_empty() {
            return Err(PipelineError::Internal(
                "schema context must not be empty".to_string(),
            ));
        }

        let prompt = sql_generation_prompt(schema_context, question);
        self.complete(Stage::SqlGeneration, prompt).await
    }

    /// Ask the oracle to describe `sql`, which must already be cleaned.
    pub async fn generate_explanation(
        &self,
        sql: &str,
        question: &str,
    ) -> Result<String, PipelineError> {
        let prompt = explanation_prompt(sql, question);
        self.complete(Stage::Explanation, prompt).await
    }

    async fn complete(&self, stage: Stage, prompt: String) -> Result<String, PipelineError> {
        debug!(%stage, model = self.backend.id(), prompt_len = prompt.len(), "Calling oracle");

        let request = CompletionRequest::new(prompt).with_stop_sequences(STOP_SEQUENCES.iter().copied());

        match tokio::time::timeout(self.timeout, self.backend.complete(request)).await {
            Err(_) => Err(PipelineError::Timeout {
                stage,
                after: self.timeout,
            }),
            Ok(Err(e)) => Err(PipelineError::from_oracle(stage, e)),
            Ok(Ok(response)) => {
                debug!(
                    %stage,
                    completion_tokens = response.usage.completion_tokens,
                    "Oracle answered"
                );
                Ok(response.content)
            }
        }
    }
}
