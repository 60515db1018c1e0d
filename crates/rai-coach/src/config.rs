//! Coach configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rai_local_ai::{paths, ModelRegistry, SamplingParams, DEFAULT_PORT};

use crate::error::CoachError;
use crate::prompt::MIN_RESPONSE_CHARS;

/// Which inference engine a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineBackend {
    /// llama-server when its binary is installed, otherwise simulated.
    #[default]
    Auto,
    LlamaServer,
    Simulated,
}

impl EngineBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineBackend::Auto => "auto",
            EngineBackend::LlamaServer => "llama-server",
            EngineBackend::Simulated => "simulated",
        }
    }
}

impl fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineBackend {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(EngineBackend::Auto),
            "llama-server" | "llama" | "llamacpp" => Ok(EngineBackend::LlamaServer),
            "simulated" | "sim" | "mock" => Ok(EngineBackend::Simulated),
            other => Err(CoachError::Configuration(format!(
                "unknown engine backend '{other}'"
            ))),
        }
    }
}

/// Configuration for a coach session.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Model loaded when none is requested (default: registry recommendation)
    pub default_model: Option<String>,
    /// Inference engine backend
    pub engine: EngineBackend,
    /// Root of the artifact cache, state store and server binary
    pub data_dir: PathBuf,
    /// Maximum transcript length, system message included
    pub transcript_cap: usize,
    /// Number of past messages sent to the engine as context
    pub history_limit: usize,
    pub sampling: SamplingParams,
    /// Responses shorter than this are replaced with a clarifying question
    pub min_response_chars: usize,
    /// Whether the transcript is saved to the state store
    pub persist_transcript: bool,
    pub server_port: u16,
    pub server_ready_timeout: Duration,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            engine: EngineBackend::Auto,
            data_dir: paths::rai_data_dir(),
            transcript_cap: 21,
            history_limit: 20,
            sampling: SamplingParams::default(),
            min_response_chars: MIN_RESPONSE_CHARS,
            persist_transcript: true,
            server_port: DEFAULT_PORT,
            server_ready_timeout: Duration::from_secs(120),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl CoachConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.default_model = std::env::var("RAI_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        if let Some(engine) = env_parse::<EngineBackend>("RAI_ENGINE") {
            config.engine = engine;
        }

        if let Ok(dir) = std::env::var("RAI_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(cap) = env_parse("RAI_TRANSCRIPT_CAP") {
            config.transcript_cap = cap;
        }
        if let Some(limit) = env_parse("RAI_HISTORY_LIMIT") {
            config.history_limit = limit;
        }
        if let Some(temperature) = env_parse("RAI_TEMPERATURE") {
            config.sampling.temperature = temperature;
        }
        if let Some(max_tokens) = env_parse("RAI_MAX_TOKENS") {
            config.sampling.max_tokens = max_tokens;
        }

        config.persist_transcript = std::env::var("RAI_PERSIST")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(true);

        if let Some(port) = env_parse("RAI_PORT") {
            config.server_port = port;
        }

        config
    }

    /// Reject settings a session cannot run with.
    pub fn validate(&self, registry: &ModelRegistry) -> Result<(), CoachError> {
        if registry.is_empty() {
            return Err(CoachError::Configuration(
                "model registry is empty".to_string(),
            ));
        }
        if self.transcript_cap < 2 {
            return Err(CoachError::Configuration(format!(
                "transcript cap must be at least 2, got {}",
                self.transcript_cap
            )));
        }
        if self.history_limit == 0 {
            return Err(CoachError::Configuration(
                "history limit must be at least 1".to_string(),
            ));
        }
        if let Some(model) = &self.default_model {
            if !registry.contains(model) {
                return Err(CoachError::Configuration(format!(
                    "default model '{model}' is not in the catalog"
                )));
            }
        }
        Ok(())
    }

    /// Directory holding artifact cache partitions.
    pub fn cache_dir(&self) -> PathBuf {
        paths::cache_dir(&self.data_dir)
    }

    /// Directory holding the key/value state store.
    pub fn state_dir(&self) -> PathBuf {
        paths::state_dir(&self.data_dir)
    }

    /// Create a builder for configuration.
    pub fn builder() -> CoachConfigBuilder {
        CoachConfigBuilder::default()
    }
}

/// Builder for coach configuration.
#[derive(Debug, Default)]
pub struct CoachConfigBuilder {
    config: CoachConfig,
}

impl CoachConfigBuilder {
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = Some(model.into());
        self
    }

    pub fn engine(mut self, engine: EngineBackend) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn transcript_cap(mut self, cap: usize) -> Self {
        self.config.transcript_cap = cap;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.config.sampling = sampling;
        self
    }

    pub fn min_response_chars(mut self, chars: usize) -> Self {
        self.config.min_response_chars = chars;
        self
    }

    pub fn persist_transcript(mut self, persist: bool) -> Self {
        self.config.persist_transcript = persist;
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server_port = port;
        self
    }

    pub fn server_ready_timeout(mut self, timeout: Duration) -> Self {
        self.config.server_ready_timeout = timeout;
        self
    }

    pub fn build(self) -> CoachConfig {
        self.config
    }
}
