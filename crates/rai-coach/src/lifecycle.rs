//! Inference engine lifecycle.
//!
//! ```text
//! Idle ──> Loading ──> Ready ──(switch)──> Loading
//!             │
//!             └──> Failed ──(retry)──> Loading
//! ```
//!
//! The manager is the only owner of the live engine. A load tears down the
//! previous engine first, so at most one engine exists at any time, and a
//! failed load never leaves a half-built engine behind.

use rai_local_ai::{
    detect_device, ArtifactCacheInspector, ChatMessage, DeviceClass, EngineFactory,
    InferenceEngine, LoadProgress, SamplingParams,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::CoachError;
use crate::state::StateHandle;

pub const LABEL_INITIALIZING: &str = "Initializing inference engine...";
pub const LABEL_LOADING_CACHED: &str = "Loading cached model...";
pub const LABEL_DOWNLOADING: &str = "Downloading model (this may take a while)...";
pub const LABEL_READY: &str = "Model loaded and ready!";
pub const LABEL_FAILED: &str = "Failed to load model";

/// Where the manager is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Idle,
    Loading,
    Ready,
    /// Last load failed. Behaves like `Idle` for retries.
    Failed,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Idle => "idle",
            LifecyclePhase::Loading => "loading",
            LifecyclePhase::Ready => "ready",
            LifecyclePhase::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct Current {
    phase: LifecyclePhase,
    model_id: Option<String>,
}

/// Owns the single live inference engine.
pub struct EngineLifecycleManager {
    factory: Arc<dyn EngineFactory>,
    inspector: ArtifactCacheInspector,
    state: StateHandle,
    current: Mutex<Current>,
    engine: RwLock<Option<Box<dyn InferenceEngine>>>,
    /// Serializes loads so one settles before the next starts.
    load_lock: AsyncMutex<()>,
    device_probe: fn() -> DeviceClass,
}

impl EngineLifecycleManager {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        inspector: ArtifactCacheInspector,
        state: StateHandle,
    ) -> Self {
        Self {
            factory,
            inspector,
            state,
            current: Mutex::new(Current {
                phase: LifecyclePhase::Idle,
                model_id: None,
            }),
            engine: RwLock::new(None),
            load_lock: AsyncMutex::new(()),
            device_probe: detect_device,
        }
    }

    /// Replace the accelerator probe.
    pub fn with_device_probe(mut self, probe: fn() -> DeviceClass) -> Self {
        self.device_probe = probe;
        self
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn inspector(&self) -> &ArtifactCacheInspector {
        &self.inspector
    }

    pub fn factory_name(&self) -> &'static str {
        self.factory.name()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.current().phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == LifecyclePhase::Ready
    }

    /// Model served by the ready engine.
    pub fn loaded_model(&self) -> Option<String> {
        let current = self.current();
        match current.phase {
            LifecyclePhase::Ready => current.model_id.clone(),
            _ => None,
        }
    }

    fn current(&self) -> std::sync::MutexGuard<'_, Current> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_phase(&self, phase: LifecyclePhase, model_id: Option<&str>) {
        let mut current = self.current();
        current.phase = phase;
        current.model_id = model_id.map(str::to_string);
    }

    /// Load `model_id` unless it is already ready.
    pub async fn ensure_loaded(&self, model_id: &str) -> Result<(), CoachError> {
        let _load = self.load_lock.lock().await;
        if self.loaded_model().as_deref() == Some(model_id) {
            debug!("Model {} already loaded", model_id);
            return Ok(());
        }
        self.load(model_id).await
    }

    /// Load `model_id` even if it, or another model, is ready.
    pub async fn switch_model(&self, model_id: &str) -> Result<(), CoachError> {
        let _load = self.load_lock.lock().await;
        info!("Switching to model: {}", model_id);
        self.load(model_id).await
    }

    async fn load(&self, model_id: &str) -> Result<(), CoachError> {
        self.set_phase(LifecyclePhase::Loading, None);
        self.state.update(|s| {
            s.loading = true;
            s.active_model_id = None;
            s.last_error = None;
            s.progress_fraction = 0.0;
            s.progress_label = LABEL_INITIALIZING.to_string();
        });

        self.teardown().await;

        let cached = self.inspector.is_model_cached(model_id).await;
        if cached {
            info!("Loading {} from cache", model_id);
            self.state
                .update(|s| s.progress_label = LABEL_LOADING_CACHED.to_string());
        } else {
            info!("Downloading {} for the first time", model_id);
            self.state
                .update(|s| s.progress_label = LABEL_DOWNLOADING.to_string());
        }

        let mut engine = self.factory.create();
        let state = self.state.clone();
        engine.set_progress_callback(Arc::new(move |p: LoadProgress| {
            debug!("Model loading progress: {:.0}% {}", p.fraction * 100.0, p.text);
            state.update(|s| {
                s.progress_fraction = p.fraction;
                s.progress_label = progress_label(cached, &p);
            });
        }));

        match engine.reload(model_id).await {
            Ok(()) => {
                let device = (self.device_probe)();
                *self.engine.write().await = Some(engine);
                self.set_phase(LifecyclePhase::Ready, Some(model_id));
                self.state.update(|s| {
                    s.loading = false;
                    s.initialized = true;
                    s.model_ready = true;
                    s.device = device;
                    s.active_model_id = Some(model_id.to_string());
                    s.progress_fraction = 1.0;
                    s.progress_label = LABEL_READY.to_string();
                });
                info!(
                    "Model {} loaded via {} on {}",
                    model_id,
                    self.factory.name(),
                    device
                );
                self.refresh_cache_status().await;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load model {}: {}", model_id, e);
                drop(engine);
                self.set_phase(LifecyclePhase::Failed, None);
                let message = e.to_string();
                self.state.update(|s| {
                    s.loading = false;
                    s.initialized = false;
                    s.model_ready = false;
                    s.active_model_id = None;
                    s.last_error = Some(message);
                    s.progress_label = LABEL_FAILED.to_string();
                });
                Err(CoachError::LoadFailure(e))
            }
        }
    }

    /// Unload and drop the live engine, if any.
    async fn teardown(&self) {
        let previous = self.engine.write().await.take();
        if let Some(mut engine) = previous {
            debug!("Releasing previous engine");
            if let Err(e) = engine.unload().await {
                warn!("Error unloading engine: {}", e);
            }
        }
    }

    /// Release the engine and return to `Idle`.
    pub async fn shutdown(&self) {
        let _load = self.load_lock.lock().await;
        self.teardown().await;
        self.set_phase(LifecyclePhase::Idle, None);
        self.state.update(|s| {
            s.initialized = false;
            s.model_ready = false;
            s.active_model_id = None;
        });
    }

    /// Run a chat completion on the ready engine and return its text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<String, CoachError> {
        if !self.is_ready() {
            return Err(CoachError::EngineNotReady);
        }
        let engine = self.engine.read().await;
        let engine = engine.as_ref().ok_or(CoachError::EngineNotReady)?;

        let completion = engine.chat_complete(messages, params).await?;
        completion
            .first_text()
            .map(str::to_string)
            .ok_or(CoachError::EmptyCompletion)
    }

    /// Best-effort accelerator probe.
    pub fn detect_device(&self) -> DeviceClass {
        (self.device_probe)()
    }

    /// Delete every model cache partition. Returns how many were removed.
    ///
    /// Waits for an in-flight load to settle first.
    pub async fn clear_cache(&self) -> usize {
        let _load = self.load_lock.lock().await;
        let removed = self.inspector.clear().await;
        self.state.update(|s| {
            s.cached = false;
            s.cache_size_bytes = 0;
        });
        info!("Cleared {} model cache partition(s)", removed);
        removed
    }

    /// Re-measure the cache and publish the result.
    pub async fn refresh_cache_status(&self) {
        let inspection = self.inspector.aggregate_cache_size().await;
        self.state.update(|s| s.apply_inspection(inspection));
    }
}

/// Label for a raw progress report.
///
/// Cached loads are tagged only for their first half; past that the engine's
/// own text is shown as is.
fn progress_label(cached: bool, progress: &LoadProgress) -> String {
    if !cached {
        format!("Downloading model: {}", progress.text)
    } else if progress.fraction < 0.5 {
        format!("Loading cached model: {}", progress.text)
    } else {
        progress.text.clone()
    }
}
