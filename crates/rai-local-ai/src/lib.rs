//! Local inference backend for RAI.
//!
//! This crate owns everything that touches model artifacts and inference
//! runtimes: the static model catalog, the partitioned artifact cache and its
//! inspector, device detection, and the engines that run a model locally
//! (a managed llama-server process, or a simulated stand-in).

mod client;
mod device;
mod download;
mod engine;
mod error;
mod inspector;
pub mod paths;
mod registry;
mod server;
mod simulated;
mod storage;

pub use client::LlamaCppClient;
pub use device::{detect_device, DeviceClass};
pub use download::ArtifactDownloader;
pub use engine::{
    ChatCompletion, ChatMessage, Choice, ChoiceMessage, EngineFactory, InferenceEngine,
    LoadProgress, ProgressCallback, Role, SamplingParams,
};
pub use error::{LocalAIError, StorageError};
pub use inspector::{ArtifactCacheInspector, CacheInspection};
pub use registry::{
    ArtifactSource, ModelDescriptor, ModelRegistry, Specialization, FALLBACK_MODEL_ID,
};
pub use server::{LlamaServerEngine, LlamaServerFactory, LlamaServerSettings};
pub use simulated::{SimulatedEngine, SimulatedFactory};
pub use storage::{
    is_model_partition, CacheStorage, DirCacheStorage, MemoryCacheStorage, MODEL_CACHE_PARTITION,
};

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 11436;
