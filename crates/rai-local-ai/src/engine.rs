//! Inference engine interface.
//!
//! An engine is bound to at most one model at a time. It is built by an
//! [`EngineFactory`], told which model to load with [`InferenceEngine::reload`],
//! and then answers chat completion requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::LocalAIError;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Chat message in OpenAI format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Generation controls forwarded with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 256,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
        }
    }
}

/// OpenAI-compatible chat completion response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Completion holding a single answer.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(text.into()),
                },
            }],
        }
    }

    /// Text of the first choice, if it has any non-whitespace content.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Raw load progress as reported by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    /// Completed share of the load, 0.0 to 1.0.
    pub fraction: f64,
    /// Free-text phase label.
    pub text: String,
}

impl LoadProgress {
    pub fn new(fraction: f64, text: impl Into<String>) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            text: text.into(),
        }
    }
}

/// Receives load progress while [`InferenceEngine::reload`] runs.
pub type ProgressCallback = Arc<dyn Fn(LoadProgress) + Send + Sync>;

/// An in-process or local inference runtime.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Register the receiver of load progress.
    fn set_progress_callback(&mut self, callback: ProgressCallback);

    /// Load `model_id`, downloading its artifacts if needed.
    async fn reload(&mut self, model_id: &str) -> Result<(), LocalAIError>;

    /// Run a chat completion against the loaded model.
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<ChatCompletion, LocalAIError>;

    /// Release the loaded model.
    async fn unload(&mut self) -> Result<(), LocalAIError> {
        Ok(())
    }
}

/// Builds fresh, unloaded engines.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn InferenceEngine>;

    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;
}
