//! Error types for coach sessions.

use rai_local_ai::{LocalAIError, StorageError};
use thiserror::Error;

/// Errors surfaced at the coach session boundary.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Invalid configuration; not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No model is loaded yet.
    #[error("AI model not initialized. Please wait for model loading to complete.")]
    EngineNotReady,

    /// A response is already being generated for this session.
    #[error("a response is already being generated")]
    Busy,

    /// Downloading or starting the model failed.
    #[error("model load failed: {0}")]
    LoadFailure(#[source] LocalAIError),

    /// The engine answered without any usable text.
    #[error("empty response from AI model")]
    EmptyCompletion,

    /// The engine failed while generating.
    #[error("engine error: {0}")]
    Engine(#[from] LocalAIError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
