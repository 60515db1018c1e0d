//! Observable session state.
//!
//! One [`EngineSessionState`] exists per session. It is mutated only through
//! [`StateHandle::update`] and broadcast to subscribers over a watch channel,
//! so every observer sees whole snapshots.

use rai_local_ai::{CacheInspection, DeviceClass};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Public state of a coach session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSessionState {
    pub initialized: bool,
    pub loading: bool,
    pub model_ready: bool,
    pub device: DeviceClass,
    pub active_model_id: Option<String>,
    /// Load progress, always within 0.0 to 1.0.
    pub progress_fraction: f64,
    pub progress_label: String,
    pub cached: bool,
    pub cache_size_bytes: u64,
    pub last_error: Option<String>,
}

impl EngineSessionState {
    /// Record the result of a cache inspection.
    pub fn apply_inspection(&mut self, inspection: CacheInspection) {
        self.cached = inspection.model_cached;
        self.cache_size_bytes = inspection.total_bytes;
    }

    fn normalize(&mut self) {
        if self.loading {
            self.initialized = false;
            self.model_ready = false;
        }
        if self.active_model_id.is_none() {
            self.model_ready = false;
        }
        self.progress_fraction = if self.progress_fraction.is_nan() {
            0.0
        } else {
            self.progress_fraction.clamp(0.0, 1.0)
        };
    }
}

/// Shared handle to the session state.
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: Arc<watch::Sender<EngineSessionState>>,
}

impl StateHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(EngineSessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply `f` to the latest state and broadcast the result.
    ///
    /// `loading` clears `initialized` and `model_ready`, and the progress
    /// fraction is clamped, before subscribers see the snapshot.
    pub fn update(&self, f: impl FnOnce(&mut EngineSessionState)) {
        self.tx.send_modify(|state| {
            f(state);
            state.normalize();
        });
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> EngineSessionState {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<EngineSessionState> {
        self.tx.subscribe()
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}
