//! Generation oracle abstraction layer.
//!
//! The pipeline only needs one capability from a model: turn a prompt into
//! text. Backends provided here:
//! - Ollama over its native `/api/generate` HTTP contract
//! - Scripted mock backend for testing

pub mod mock;
pub mod ollama;
pub mod traits;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Usage};
