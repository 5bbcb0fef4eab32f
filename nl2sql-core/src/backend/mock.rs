//! Mock generation backend for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::*;

/// Mock backend for testing.
///
/// Scripted responses are handed out in order, one per `complete` call;
/// once the script runs dry every call gets the default response.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    default_response: String,
    script: Mutex<VecDeque<String>>,
    failure: Option<(u16, String)>,
    delay: Option<Duration>,
    models: Vec<String>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        Self {
            models: vec![model_id.clone()],
            model_id,
            available: AtomicBool::new(true),
            default_response: "Mock response".to_string(),
            script: Mutex::new(VecDeque::new()),
            failure: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the response used when no scripted response is queued.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = content.into();
        self
    }

    /// Queue responses, consumed in order.
    pub fn with_script<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Answer every call with a non-success status.
    pub fn with_failure(mut self, status: u16, body: impl Into<String>) -> Self {
        self.failure = Some((status, body.into()));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Set the model listing.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        if let Some((status, body)) = &self.failure {
            return Err(LlmError::RequestFailed {
                status: *status,
                body: body.clone(),
            });
        }

        let content = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone());

        // Rough token estimate
        let usage = Usage {
            prompt_tokens: request.prompt.len() as u32 / 4,
            completion_tokens: content.len() as u32 / 4,
        };

        Ok(CompletionResponse { content, usage })
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }
        Ok(self.models.clone())
    }
}
