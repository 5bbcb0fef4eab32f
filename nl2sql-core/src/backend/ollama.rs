//! Ollama generation backend.
//!
//! Talks to Ollama's native API rather than its OpenAI-compatible layer:
//! `POST {base}/api/generate` for completions and `GET {base}/api/tags`
//! for the model listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::*;
use crate::config::OllamaConfig;

/// Ollama backend.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            request_timeout: config.request_timeout,
            probe_timeout: config.probe_timeout,
        })
    }

    /// Create a backend pointing to a local Ollama.
    pub fn local(model: &str) -> Result<Self, LlmError> {
        Self::new(&OllamaConfig::new("http://localhost:11434", model))
    }

    /// Server root this backend talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    fn map_send_error(&self, e: reqwest::Error, timeout: Duration) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::NetworkError(e.to_string())
        }
    }
}

/// `/api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    temperature: f32,
    top_p: f32,
    stop: &'a [String],
}

/// `/api/generate` response body (non-streaming).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

/// `/api/tags` response body.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.tags_url())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map(|r| r.status() == StatusCode::OK)
            .unwrap_or(false)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature.unwrap_or(self.temperature),
                top_p: request.top_p.unwrap_or(self.top_p),
                stop: &request.stop_sequences,
            },
        };

        debug!(model = %self.model, prompt_len = request.prompt.len(), "Calling Ollama generate");

        let response = self
            .client
            .post(self.generate_url())
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, self.request_timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.request_timeout)
            } else {
                LlmError::ParseError(e.to_string())
            }
        })?;

        Ok(CompletionResponse {
            content: generated.response.trim().to_string(),
            usage: Usage {
                prompt_tokens: generated.prompt_eval_count.unwrap_or(0),
                completion_tokens: generated.eval_count.unwrap_or(0),
            },
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(self.tags_url())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, self.probe_timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
