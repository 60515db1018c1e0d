//! # RAI Coach
//!
//! Session core of the RAI wellness coach: loads a local model, keeps the
//! conversation transcript and publishes one observable state object that
//! every UI surface reads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌───────────────────┐
//! │  User text  │ --> │  CoachSession   │ --> │ Engine lifecycle  │
//! └─────────────┘     │ (clean, record) │     │ (load, complete)  │
//!                     └────────┬────────┘     └─────────┬─────────┘
//!                              │                        │
//!                        ┌─────┴──────┐         ┌───────┴────────┐
//!                        │ Transcript │         │ Session state  │
//!                        └────────────┘         │  (watch)       │
//!                                               └────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use rai_coach::{CoachConfig, CoachSession};
//!
//! let session = CoachSession::open(CoachConfig::from_env()).await?;
//! session.initialize(None).await?;
//!
//! let reply = session.generate_response("I've been feeling anxious").await?;
//! ```

mod config;
mod error;
mod lifecycle;
mod prompt;
mod session;
mod state;
mod store;
mod transcript;

#[cfg(test)]
mod testing;

pub use config::{CoachConfig, CoachConfigBuilder, EngineBackend};
pub use error::CoachError;
pub use lifecycle::{
    EngineLifecycleManager, LifecyclePhase, LABEL_DOWNLOADING, LABEL_FAILED, LABEL_INITIALIZING,
    LABEL_LOADING_CACHED, LABEL_READY,
};
pub use prompt::{
    clean_response, finalize_response, FinalResponse, Substitution, APOLOGY_RESPONSE,
    CLARIFYING_RESPONSE, DENYLIST, MIN_RESPONSE_CHARS, REDIRECT_RESPONSE, SYSTEM_PREAMBLE,
};
pub use session::{CoachSession, SessionParts, LABEL_CACHED_AT_STARTUP, LABEL_EMPTY_AT_STARTUP};
pub use state::{EngineSessionState, StateHandle};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use transcript::{ConversationMessage, TranscriptStore, TRANSCRIPT_KEY};

// Re-export backend types the UI layer needs
pub use rai_local_ai::{
    paths as local_ai_paths, DeviceClass, ModelDescriptor, ModelRegistry, Role, SamplingParams,
    Specialization, DEFAULT_PORT as DEFAULT_LOCAL_AI_PORT,
};
