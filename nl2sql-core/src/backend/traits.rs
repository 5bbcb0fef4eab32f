//! Core traits for generation backends.
//!
//! This module defines the `LlmBackend` trait - the narrow interface the
//! pipeline uses to reach a text-completion oracle.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for oracle calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Oracle answered with a non-success status
    #[error("Oracle returned HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Oracle did not answer in time
    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Core trait for generation backends.
///
/// Implementations are full-response only; there is no streaming path.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend identifier (the model name).
    fn id(&self) -> &str;

    /// Check if the backend is currently reachable.
    async fn is_available(&self) -> bool;

    /// Complete a prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// List the models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

/// Request for a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Fully rendered prompt text
    pub prompt: String,
    /// Sequences that stop generation
    pub stop_sequences: Vec<String>,
    /// Temperature override (backend default when unset)
    pub temperature: Option<f32>,
    /// Nucleus sampling override (backend default when unset)
    pub top_p: Option<f32>,
}

impl CompletionRequest {
    /// Create a new request for a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set stop sequences.
    pub fn with_stop_sequences<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = stops.into_iter().map(Into::into).collect();
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Set nucleus sampling.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p.clamp(0.0, 1.0));
        self
    }
}

/// Response from a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content, untrusted
    pub content: String,
    /// Token usage
    pub usage: Usage,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl Usage {
    /// Get total tokens.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}
