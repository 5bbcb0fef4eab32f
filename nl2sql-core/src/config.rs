//! Construction-time configuration.
//!
//! Both values are built once and handed to the service; nothing in the
//! pipeline reads the environment per call.

use std::time::Duration;

/// Row ceiling applied to SELECT statements that carry no LIMIT.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Configuration for the request pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Row ceiling used when the caller gives none
    pub default_row_limit: u32,
    /// Upper bound on each oracle call
    pub generation_timeout: Duration,
    /// Upper bound on one data-store execute call
    pub execution_timeout: Duration,
    /// Sample rows fetched per table when synthesising a schema context
    pub inspected_sample_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_row_limit: DEFAULT_ROW_LIMIT,
            generation_timeout: Duration::from_secs(120),
            execution_timeout: Duration::from_secs(30),
            inspected_sample_rows: 3,
        }
    }
}

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server root, without the `/api` suffix
    pub base_url: String,
    /// Model to generate with
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Timeout for generation calls
    pub request_timeout: Duration,
    /// Timeout for availability probes and model listing
    pub probe_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            temperature: 0.1,
            top_p: 0.9,
            request_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl OllamaConfig {
    /// Create a configuration for a server and model, keeping default sampling.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Default::default()
        }
    }
}
