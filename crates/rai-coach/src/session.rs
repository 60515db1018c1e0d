//! Coach session orchestrator.
//!
//! The session ties the engine lifecycle to the transcript: it builds the
//! context window for each user message, runs the completion, cleans the
//! answer and records the exchange. It is the surface the UI talks to.

use rai_local_ai::{
    detect_device, ArtifactCacheInspector, CacheStorage, ChatMessage, DirCacheStorage,
    EngineFactory, LlamaServerFactory, LlamaServerSettings, MemoryCacheStorage, ModelDescriptor,
    ModelRegistry, Role, SimulatedFactory,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{CoachConfig, EngineBackend};
use crate::error::CoachError;
use crate::lifecycle::{EngineLifecycleManager, LifecyclePhase};
use crate::prompt::{finalize_response, APOLOGY_RESPONSE, SYSTEM_PREAMBLE};
use crate::state::{EngineSessionState, StateHandle};
use crate::store::{FileKeyValueStore, KeyValueStore};
use crate::transcript::{ConversationMessage, TranscriptStore};

pub const LABEL_CACHED_AT_STARTUP: &str = "Models already cached - ready for instant loading";
pub const LABEL_EMPTY_AT_STARTUP: &str = "No cached models found";

/// Collaborators a session is built from.
pub struct SessionParts {
    pub registry: ModelRegistry,
    pub factory: Arc<dyn EngineFactory>,
    pub cache: Arc<dyn CacheStorage>,
    /// Transcript persistence; `None` keeps the conversation in memory only.
    pub store: Option<Arc<dyn KeyValueStore>>,
}

impl SessionParts {
    /// Wire the host collaborators selected by `config`.
    pub fn from_config(config: &CoachConfig) -> Self {
        let registry = ModelRegistry::builtin();

        let store: Option<Arc<dyn KeyValueStore>> = if config.persist_transcript {
            Some(Arc::new(FileKeyValueStore::new(config.state_dir())))
        } else {
            None
        };

        let llama = || {
            let mut settings = LlamaServerSettings::new(&config.data_dir);
            settings.port = config.server_port;
            settings.ready_timeout = config.server_ready_timeout;
            settings.device = detect_device();
            LlamaServerFactory::new(settings, registry)
        };

        let use_llama = match config.engine {
            EngineBackend::LlamaServer => true,
            EngineBackend::Simulated => false,
            EngineBackend::Auto => {
                let available = llama().binary_exists();
                if !available {
                    info!("llama-server binary not installed, using simulated engine");
                }
                available
            }
        };

        if use_llama {
            Self {
                registry,
                factory: Arc::new(llama()),
                cache: Arc::new(DirCacheStorage::new(config.cache_dir())),
                store,
            }
        } else {
            let cache = Arc::new(MemoryCacheStorage::new());
            Self {
                registry,
                factory: Arc::new(SimulatedFactory::new(registry).with_cache(cache.clone())),
                cache,
                store,
            }
        }
    }
}

/// Clears the busy flag when a generation ends, however it ends.
struct GenerationToken<'a>(&'a AtomicBool);

impl<'a> GenerationToken<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CoachError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CoachError::Busy)
    }
}

impl Drop for GenerationToken<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A conversation with the wellness coach.
pub struct CoachSession {
    config: CoachConfig,
    registry: ModelRegistry,
    lifecycle: EngineLifecycleManager,
    transcript: Mutex<TranscriptStore>,
    generating: AtomicBool,
}

impl CoachSession {
    /// Open a session with the collaborators `config` selects.
    pub async fn open(config: CoachConfig) -> Result<Self, CoachError> {
        let parts = SessionParts::from_config(&config);
        Self::with_parts(config, parts).await
    }

    /// Open a session over explicit collaborators.
    ///
    /// Validates the configuration, restores the persisted transcript and
    /// publishes the startup cache status. Does not load a model.
    pub async fn with_parts(config: CoachConfig, parts: SessionParts) -> Result<Self, CoachError> {
        config.validate(&parts.registry)?;

        let mut transcript = TranscriptStore::new(SYSTEM_PREAMBLE, config.transcript_cap);
        if let Some(store) = parts.store {
            transcript = transcript.with_store(store);
            if transcript.restore(SYSTEM_PREAMBLE) {
                info!(
                    "Restored conversation with {} message(s)",
                    transcript.len() - 1
                );
            }
        }

        let lifecycle = EngineLifecycleManager::new(
            parts.factory,
            ArtifactCacheInspector::new(parts.cache),
            StateHandle::new(),
        );

        let session = Self {
            config,
            registry: parts.registry,
            lifecycle,
            transcript: Mutex::new(transcript),
            generating: AtomicBool::new(false),
        };
        session.inspect_cache_at_startup().await;
        Ok(session)
    }

    /// Replace the accelerator probe used when a model finishes loading.
    pub fn with_device_probe(mut self, probe: fn() -> rai_local_ai::DeviceClass) -> Self {
        self.lifecycle = self.lifecycle.with_device_probe(probe);
        self
    }

    async fn inspect_cache_at_startup(&self) {
        let inspection = self.lifecycle.inspector().aggregate_cache_size().await;
        self.lifecycle.state().update(|s| {
            s.apply_inspection(inspection);
            s.progress_label = if inspection.model_cached {
                LABEL_CACHED_AT_STARTUP
            } else {
                LABEL_EMPTY_AT_STARTUP
            }
            .to_string();
        });
    }

    fn transcript(&self) -> MutexGuard<'_, TranscriptStore> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Name of the engine backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.lifecycle.factory_name()
    }

    pub fn state(&self) -> EngineSessionState {
        self.lifecycle.state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineSessionState> {
        self.lifecycle.state().subscribe()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    /// Whether a response is being generated.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Answer `user_text` and record the exchange.
    ///
    /// Engine failures are logged and answered with a fixed apology; the
    /// transcript is left untouched in that case. Degenerate output is
    /// replaced with canned text and recorded.
    pub async fn generate_response(&self, user_text: &str) -> Result<String, CoachError> {
        let _token = GenerationToken::acquire(&self.generating)?;
        if !self.lifecycle.is_ready() {
            return Err(CoachError::EngineNotReady);
        }

        let (context, epoch) = {
            let transcript = self.transcript();
            let mut context: Vec<ChatMessage> = Vec::with_capacity(self.config.history_limit + 2);
            if let Some(system) = transcript.system_message() {
                context.push(system.into());
            }
            context.extend(
                transcript
                    .recent(self.config.history_limit)
                    .iter()
                    .map(ChatMessage::from),
            );
            context.push(ChatMessage::new(Role::User, user_text));
            (context, transcript.epoch())
        };
        debug!("Generating response with {} context message(s)", context.len());

        let raw = match self
            .lifecycle
            .complete(&context, &self.config.sampling)
            .await
        {
            Ok(raw) => raw,
            Err(CoachError::EmptyCompletion) => {
                warn!("Engine returned an empty completion");
                String::new()
            }
            Err(CoachError::EngineNotReady) => return Err(CoachError::EngineNotReady),
            Err(e) => {
                error!("Error generating AI response: {}", e);
                return Ok(APOLOGY_RESPONSE.to_string());
            }
        };

        let response = finalize_response(&raw, self.config.min_response_chars);
        if let Some(reason) = response.substitution {
            debug!("Replaced model output ({:?})", reason);
        }

        let mut transcript = self.transcript();
        if transcript.epoch() == epoch {
            transcript.append(Role::User, user_text);
            transcript.append(Role::Assistant, response.text.clone());
            if self.config.persist_transcript {
                if let Err(e) = transcript.persist() {
                    warn!("Could not save conversation history: {}", e);
                }
            }
        } else {
            debug!("Conversation was cleared during generation, exchange not recorded");
        }

        Ok(response.text)
    }

    /// User and assistant messages, oldest first.
    pub fn conversation_history(&self) -> Vec<ConversationMessage> {
        self.transcript().history(false)
    }

    /// Start a new conversation and drop the saved one.
    pub fn clear_conversation(&self) -> Result<(), CoachError> {
        let mut transcript = self.transcript();
        transcript.reset(SYSTEM_PREAMBLE);
        info!("Conversation cleared");
        if self.config.persist_transcript {
            transcript.forget()?;
        }
        Ok(())
    }

    /// Model a load without an explicit id targets.
    pub fn default_model_id(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or_else(|| self.registry.get_recommended_or_first().id)
    }

    /// Load `model_id`, or the default model, unless it is already ready.
    pub async fn initialize(&self, model_id: Option<&str>) -> Result<(), CoachError> {
        let model = self.catalog_entry(model_id.unwrap_or_else(|| self.default_model_id()))?;
        self.lifecycle.ensure_loaded(model.id).await
    }

    /// Unknown ids are rejected before the lifecycle is touched.
    fn catalog_entry(&self, model_id: &str) -> Result<&'static ModelDescriptor, CoachError> {
        self.registry.get_by_id(model_id).ok_or_else(|| {
            warn!("Rejected unknown model id '{}'", model_id);
            CoachError::Configuration(format!("unknown model '{model_id}'"))
        })
    }

    /// Load the default model unless a load is running or a model is ready.
    pub async fn retry_initialization(&self) -> Result<(), CoachError> {
        match self.lifecycle.phase() {
            LifecyclePhase::Loading | LifecyclePhase::Ready => {
                debug!("Skipping retry, engine is {}", self.lifecycle.phase().as_str());
                Ok(())
            }
            LifecyclePhase::Idle | LifecyclePhase::Failed => self.initialize(None).await,
        }
    }

    /// Load `model_id`, replacing whatever is loaded.
    pub async fn switch_model(&self, model_id: &str) -> Result<(), CoachError> {
        let model = self.catalog_entry(model_id)?;
        self.lifecycle.switch_model(model.id).await
    }

    /// Delete cached model artifacts. Returns how many partitions were removed.
    pub async fn clear_model_cache(&self) -> usize {
        self.lifecycle.clear_cache().await
    }

    /// Re-measure the artifact cache.
    pub async fn refresh_cache_status(&self) -> EngineSessionState {
        self.lifecycle.refresh_cache_status().await;
        self.state()
    }

    pub fn detect_device(&self) -> rai_local_ai::DeviceClass {
        self.lifecycle.detect_device()
    }

    /// Whether `model_id` has artifacts in the cache.
    pub async fn is_model_cached(&self, model_id: &str) -> bool {
        self.lifecycle.inspector().is_model_cached(model_id).await
    }

    pub fn list_available(&self) -> &'static [ModelDescriptor] {
        self.registry.list_available()
    }

    /// Catalog entry of the loaded model.
    pub fn current_model_info(&self) -> Option<&'static ModelDescriptor> {
        self.lifecycle
            .loaded_model()
            .and_then(|id| self.registry.get_by_id(&id))
    }

    /// Release the engine.
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{CLARIFYING_RESPONSE, REDIRECT_RESPONSE};
    use crate::store::MemoryKeyValueStore;
    use crate::transcript::TRANSCRIPT_KEY;
    use rai_local_ai::StorageError;
    use crate::testing::{Reply, Script, ScriptedFactory};
    use rai_local_ai::{DeviceClass, MODEL_CACHE_PARTITION};
    use tempfile::tempdir;

    const MODEL: &str = "Llama-3.2-3B-Instruct-Q4_K_M";

    struct Fixture {
        session: Arc<CoachSession>,
        script: Arc<Script>,
        store: Arc<MemoryKeyValueStore>,
    }

    async fn open_with(config: CoachConfig, cache: Arc<MemoryCacheStorage>) -> Fixture {
        let (factory, script) = ScriptedFactory::new();
        let store = Arc::new(MemoryKeyValueStore::new());
        let parts = SessionParts {
            registry: ModelRegistry::builtin(),
            factory,
            cache,
            store: Some(store.clone()),
        };
        let session = CoachSession::with_parts(config, parts)
            .await
            .unwrap()
            .with_device_probe(|| DeviceClass::Accelerated);
        Fixture {
            session: Arc::new(session),
            script,
            store,
        }
    }

    async fn ready() -> Fixture {
        let fixture = open_with(
            CoachConfig::builder().default_model(MODEL).build(),
            Arc::new(MemoryCacheStorage::new()),
        )
        .await;
        fixture.session.initialize(None).await.unwrap();
        fixture
    }

    fn contents(session: &CoachSession) -> Vec<String> {
        session
            .conversation_history()
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    #[tokio::test]
    async fn test_generate_records_exchange() {
        let f = ready().await;

        let reply = f.session.generate_response("I feel stressed").await.unwrap();
        assert!(reply.contains("heaviest"));

        let history = f.session.conversation_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "I feel stressed");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, reply);
    }

    #[tokio::test]
    async fn test_short_output_is_replaced_and_recorded() {
        let f = ready().await;
        f.script.set_reply(Reply::Text("Ok.".to_string()));

        let reply = f.session.generate_response("hello").await.unwrap();
        assert_eq!(reply, CLARIFYING_RESPONSE);
        assert_eq!(contents(&f.session), vec!["hello", CLARIFYING_RESPONSE]);
    }

    #[tokio::test]
    async fn test_empty_completion_is_replaced_and_recorded() {
        let f = ready().await;
        f.script.set_reply(Reply::Empty);

        let reply = f.session.generate_response("hello").await.unwrap();
        assert_eq!(reply, CLARIFYING_RESPONSE);
        assert_eq!(f.session.conversation_history().len(), 2);
    }

    #[tokio::test]
    async fn test_denylisted_output_is_redirected() {
        let f = ready().await;
        f.script.set_reply(Reply::Text(
            "I am not a therapist, but here is what I think about that.".to_string(),
        ));

        let reply = f.session.generate_response("help").await.unwrap();
        assert_eq!(reply, REDIRECT_RESPONSE);
    }

    #[tokio::test]
    async fn test_engine_failure_returns_apology_without_recording() {
        let f = ready().await;
        f.session.generate_response("first").await.unwrap();
        f.script.set_reply(Reply::Fail);

        let reply = f.session.generate_response("second").await.unwrap();
        assert_eq!(reply, APOLOGY_RESPONSE);

        let history = f.session.conversation_history();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.content != "second"));
    }

    #[tokio::test]
    async fn test_not_ready_is_an_error() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;

        let err = f.session.generate_response("hi").await.unwrap_err();
        assert!(matches!(err, CoachError::EngineNotReady));
        assert!(f.session.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_context_window_is_bounded() {
        let f = open_with(
            CoachConfig::builder().history_limit(2).build(),
            Arc::new(MemoryCacheStorage::new()),
        )
        .await;
        f.session.initialize(None).await.unwrap();

        for text in ["one", "two", "three"] {
            f.session.generate_response(text).await.unwrap();
        }

        let sent = f.script.last_messages.lock().unwrap().clone();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].content, SYSTEM_PREAMBLE);
        assert_eq!(sent[1].content, "two");
        assert_eq!(sent[2].role, Role::Assistant);
        assert_eq!(sent[3].content, "three");
    }

    #[tokio::test]
    async fn test_concurrent_generation_is_busy() {
        let f = ready().await;
        f.script.hold.store(true, Ordering::SeqCst);

        let session = f.session.clone();
        let first = tokio::spawn(async move { session.generate_response("first").await });
        f.script.entered.notified().await;

        let err = f.session.generate_response("second").await.unwrap_err();
        assert!(matches!(err, CoachError::Busy));

        f.script.release.add_permits(1);
        first.await.unwrap().unwrap();
        assert!(!f.session.is_generating());
        assert_eq!(contents(&f.session)[0], "first");
    }

    #[tokio::test]
    async fn test_clear_during_generation_discards_exchange() {
        let f = ready().await;
        f.script.hold.store(true, Ordering::SeqCst);

        let session = f.session.clone();
        let pending = tokio::spawn(async move { session.generate_response("hello").await });
        f.script.entered.notified().await;

        f.session.clear_conversation().unwrap();
        f.script.release.add_permits(1);

        let reply = pending.await.unwrap().unwrap();
        assert!(reply.contains("heaviest"));
        assert!(f.session.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_retry_is_noop_when_ready() {
        let f = ready().await;
        f.session.retry_initialization().await.unwrap();
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_after_failure_loads_again() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;
        f.script.fail_load.store(true, Ordering::SeqCst);
        assert!(f.session.initialize(None).await.is_err());
        assert_eq!(f.session.phase(), LifecyclePhase::Failed);
        assert!(f.session.state().last_error.is_some());

        f.script.fail_load.store(false, Ordering::SeqCst);
        f.session.retry_initialization().await.unwrap();
        assert_eq!(f.session.phase(), LifecyclePhase::Ready);
        assert!(f.session.state().last_error.is_none());
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_model_falls_back_to_recommendation() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;
        f.session.initialize(None).await.unwrap();

        let info = f.session.current_model_info().unwrap();
        assert_eq!(info.id, ModelRegistry::builtin().get_recommended_or_first().id);
        assert_eq!(f.session.state().device, DeviceClass::Accelerated);
    }

    #[tokio::test]
    async fn test_switch_model_reloads() {
        let f = ready().await;
        f.session.switch_model("gemma-2-2b-it-Q4_K_M").await.unwrap();

        assert_eq!(
            f.session.current_model_info().unwrap().id,
            "gemma-2-2b-it-Q4_K_M"
        );
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_startup_cache_labels() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;
        assert_eq!(f.session.state().progress_label, LABEL_EMPTY_AT_STARTUP);

        let cache = Arc::new(MemoryCacheStorage::new());
        cache
            .insert(MODEL_CACHE_PARTITION, "https://host/llama-3.2-3b-instruct-q4_k_m/shard1", 2048)
            .unwrap();
        let f = open_with(CoachConfig::default(), cache).await;
        let state = f.session.state();
        assert_eq!(state.progress_label, LABEL_CACHED_AT_STARTUP);
        assert!(state.cached);
        assert_eq!(state.cache_size_bytes, 2048);
        assert!(f.session.is_model_cached(MODEL).await);
    }

    #[tokio::test]
    async fn test_clear_model_cache_when_empty() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;
        assert_eq!(f.session.clear_model_cache().await, 0);

        let state = f.session.state();
        assert!(!state.cached);
        assert_eq!(state.cache_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_conversation_survives_reopen() {
        let f = ready().await;
        f.session.generate_response("I can't sleep").await.unwrap();

        let parts = SessionParts {
            registry: ModelRegistry::builtin(),
            factory: ScriptedFactory::new().0,
            cache: Arc::new(MemoryCacheStorage::new()),
            store: Some(f.store.clone()),
        };
        let reopened = CoachSession::with_parts(CoachConfig::default(), parts)
            .await
            .unwrap();
        assert_eq!(contents(&reopened)[0], "I can't sleep");

        reopened.clear_conversation().unwrap();
        assert!(reopened.conversation_history().is_empty());
        assert_eq!(f.store.get_item(TRANSCRIPT_KEY).unwrap(), None);
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_clear_reports_storage_failure() {
        let parts = SessionParts {
            registry: ModelRegistry::builtin(),
            factory: ScriptedFactory::new().0,
            cache: Arc::new(MemoryCacheStorage::new()),
            store: Some(Arc::new(BrokenStore)),
        };
        let session = CoachSession::with_parts(CoachConfig::default(), parts)
            .await
            .unwrap();

        let err = session.clear_conversation().unwrap_err();
        assert!(matches!(err, CoachError::Storage(_)));
        assert!(session.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_model_keeps_ready_engine() {
        let f = ready().await;

        let err = f.session.switch_model("Llama-3.2-1B-typo").await.unwrap_err();
        assert!(matches!(err, CoachError::Configuration(_)));
        assert_eq!(f.session.phase(), LifecyclePhase::Ready);
        assert_eq!(f.session.state().active_model_id.as_deref(), Some(MODEL));
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 1);
        assert!(f.session.generate_response("still there?").await.is_ok());

        let err = f.session.initialize(Some("nope")).await.unwrap_err();
        assert!(matches!(err, CoachError::Configuration(_)));
        assert_eq!(f.session.phase(), LifecyclePhase::Ready);
    }

    #[tokio::test]
    async fn test_retry_is_noop_while_loading() {
        let f = open_with(CoachConfig::default(), Arc::new(MemoryCacheStorage::new())).await;
        f.script.hold_reload.store(true, Ordering::SeqCst);

        let session = f.session.clone();
        let loading = tokio::spawn(async move { session.initialize(None).await });
        f.script.reload_entered.notified().await;
        assert_eq!(f.session.phase(), LifecyclePhase::Loading);

        f.session.retry_initialization().await.unwrap();
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 1);

        f.script.reload_release.add_permits(1);
        loading.await.unwrap().unwrap();
        assert_eq!(f.session.phase(), LifecyclePhase::Ready);
        assert_eq!(f.script.creates.load(Ordering::SeqCst), 1);
        assert_eq!(f.script.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_registry_is_a_configuration_error() {
        let (factory, _) = ScriptedFactory::new();
        let parts = SessionParts {
            registry: ModelRegistry::new(&[]),
            factory,
            cache: Arc::new(MemoryCacheStorage::new()),
            store: None,
        };
        let result = CoachSession::with_parts(CoachConfig::default(), parts).await;
        assert!(matches!(result, Err(CoachError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_simulated_parts_from_config() {
        let dir = tempdir().unwrap();
        let config = CoachConfig::builder()
            .data_dir(dir.path())
            .engine(EngineBackend::Auto)
            .build();

        let parts = SessionParts::from_config(&config);
        assert_eq!(parts.factory.name(), "simulated");
        assert!(parts.store.is_some());
    }
}
