//! Simulated engine for hosts that cannot run a real model.
//!
//! Loads in a few staged steps and answers with a reflective sentence built
//! from the latest user message. Useful for demos, CI and UI development.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::engine::{
    ChatCompletion, ChatMessage, EngineFactory, InferenceEngine, LoadProgress, ProgressCallback,
    Role, SamplingParams,
};
use crate::error::LocalAIError;
use crate::registry::ModelRegistry;
use crate::storage::{MemoryCacheStorage, MODEL_CACHE_PARTITION};

const LOAD_STEPS: u32 = 5;
const SHARD_BYTES: u64 = 64 * 1024 * 1024;

/// Engine that pretends to load a model and echoes the user back.
pub struct SimulatedEngine {
    registry: ModelRegistry,
    cache: Option<Arc<MemoryCacheStorage>>,
    step_delay: Duration,
    model_id: Option<String>,
    progress: Option<ProgressCallback>,
}

impl SimulatedEngine {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            cache: None,
            step_delay: Duration::from_millis(200),
            model_id: None,
            progress: None,
        }
    }

    /// Record fake shards in `cache` so cache inspection sees the model.
    pub fn with_cache(mut self, cache: Arc<MemoryCacheStorage>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Delay between load steps.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    fn shard_url(model_id: &str, shard: u32) -> String {
        format!(
            "https://simulated.local/{}/params_shard_{}.bin",
            model_id, shard
        )
    }

    fn reply_to(messages: &[ChatMessage]) -> String {
        let said = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .unwrap_or_default();

        format!(
            "I understand you're saying: \"{}\". As your AI wellness coach, I'm here to support \
             you through this. Let me help you explore some healthy coping strategies and \
             perspectives that might be beneficial for your current situation.",
            said
        )
    }
}

#[async_trait]
impl InferenceEngine for SimulatedEngine {
    fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    async fn reload(&mut self, model_id: &str) -> Result<(), LocalAIError> {
        self.model_id = None;
        if !self.registry.contains(model_id) {
            return Err(LocalAIError::ModelNotFound(model_id.to_string()));
        }

        for step in 1..=LOAD_STEPS {
            sleep(self.step_delay).await;
            if let Some(cache) = &self.cache {
                cache.insert(
                    MODEL_CACHE_PARTITION,
                    &Self::shard_url(model_id, step),
                    SHARD_BYTES,
                )?;
            }
            if let Some(callback) = &self.progress {
                callback(LoadProgress::new(
                    f64::from(step) / f64::from(LOAD_STEPS),
                    format!("Fetching param cache[{}/{}]", step, LOAD_STEPS),
                ));
            }
        }

        debug!("Simulated model {} loaded", model_id);
        self.model_id = Some(model_id.to_string());
        Ok(())
    }

    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        _params: &SamplingParams,
    ) -> Result<ChatCompletion, LocalAIError> {
        if self.model_id.is_none() {
            return Err(LocalAIError::NoModelLoaded);
        }
        Ok(ChatCompletion::from_text(Self::reply_to(messages)))
    }

    async fn unload(&mut self) -> Result<(), LocalAIError> {
        self.model_id = None;
        Ok(())
    }
}

/// Builds [`SimulatedEngine`]s.
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    registry: ModelRegistry,
    cache: Option<Arc<MemoryCacheStorage>>,
    step_delay: Duration,
}

impl SimulatedFactory {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            cache: None,
            step_delay: Duration::from_millis(200),
        }
    }

    pub fn with_cache(mut self, cache: Arc<MemoryCacheStorage>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

impl EngineFactory for SimulatedFactory {
    fn create(&self) -> Box<dyn InferenceEngine> {
        let mut engine = SimulatedEngine::new(self.registry).with_step_delay(self.step_delay);
        if let Some(cache) = &self.cache {
            engine = engine.with_cache(cache.clone());
        }
        Box::new(engine)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CacheStorage;
    use std::sync::Mutex;

    fn engine() -> SimulatedEngine {
        SimulatedEngine::new(ModelRegistry::builtin()).with_step_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_reload_reports_staged_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut engine = engine();
        engine.set_progress_callback(Arc::new(move |p| sink.lock().unwrap().push(p.fraction)));

        engine.reload("Qwen2.5-1.5B-Instruct-Q4_K_M").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), LOAD_STEPS as usize);
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[tokio::test]
    async fn test_reply_quotes_latest_user_message() {
        let mut engine = engine();
        engine.reload("gemma-2-2b-it-Q4_K_M").await.unwrap();

        let messages = vec![
            ChatMessage::new(Role::System, "be kind"),
            ChatMessage::new(Role::User, "first"),
            ChatMessage::new(Role::Assistant, "ok"),
            ChatMessage::new(Role::User, "I feel stressed"),
        ];
        let completion = engine
            .chat_complete(&messages, &SamplingParams::default())
            .await
            .unwrap();
        assert!(completion
            .first_text()
            .unwrap()
            .contains("\"I feel stressed\""));
    }

    #[tokio::test]
    async fn test_unknown_model_and_unloaded_engine() {
        let mut engine = engine();
        assert!(matches!(
            engine.reload("missing").await,
            Err(LocalAIError::ModelNotFound(_))
        ));
        assert!(matches!(
            engine.chat_complete(&[], &SamplingParams::default()).await,
            Err(LocalAIError::NoModelLoaded)
        ));
    }

    #[tokio::test]
    async fn test_records_shards_in_cache() {
        let cache = Arc::new(MemoryCacheStorage::new());
        let factory = SimulatedFactory::new(ModelRegistry::builtin())
            .with_cache(cache.clone())
            .with_step_delay(Duration::ZERO);

        let mut engine = factory.create();
        engine.reload("Llama-3.2-3B-Instruct-Q4_K_M").await.unwrap();

        let urls = cache.resource_urls(MODEL_CACHE_PARTITION).await.unwrap();
        assert_eq!(urls.len(), LOAD_STEPS as usize);
    }
}
