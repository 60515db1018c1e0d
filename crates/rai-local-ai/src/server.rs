//! Inference engine backed by a llama-server child process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::device::DeviceClass;
use crate::download::ArtifactDownloader;
use crate::engine::{
    ChatCompletion, ChatMessage, EngineFactory, InferenceEngine, LoadProgress, ProgressCallback,
    SamplingParams,
};
use crate::error::LocalAIError;
use crate::paths::{cache_dir, llama_server_path};
use crate::registry::ModelRegistry;
use crate::storage::DirCacheStorage;
use crate::DEFAULT_PORT;

/// Share of the load progress attributed to the artifact download.
const DOWNLOAD_SHARE: f64 = 0.9;

/// How long a server gets to exit after SIGTERM before it is killed.
const STOP_GRACE: Duration = Duration::from_millis(500);
const STOP_POLL: Duration = Duration::from_millis(50);

/// Settings shared by every llama-server engine a factory builds.
#[derive(Debug, Clone)]
pub struct LlamaServerSettings {
    pub data_dir: PathBuf,
    pub port: u16,
    pub ready_timeout: Duration,
    pub context_size: u32,
    pub device: DeviceClass,
}

impl LlamaServerSettings {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            port: DEFAULT_PORT,
            ready_timeout: Duration::from_secs(120),
            context_size: 4096,
            device: DeviceClass::CpuFallback,
        }
    }

    /// Path of the server binary these settings point at.
    pub fn binary_path(&self) -> PathBuf {
        llama_server_path(&self.data_dir)
    }
}

/// Manager for one llama-server process serving one model.
pub struct LlamaServerEngine {
    settings: LlamaServerSettings,
    registry: ModelRegistry,
    downloader: ArtifactDownloader,
    client: LlamaCppClient,
    process: Option<Child>,
    model_id: Option<String>,
    progress: Option<ProgressCallback>,
}

impl LlamaServerEngine {
    pub fn new(settings: LlamaServerSettings, registry: ModelRegistry) -> Self {
        let downloader = ArtifactDownloader::new(DirCacheStorage::new(cache_dir(&settings.data_dir)));
        let client = LlamaCppClient::with_port(settings.port);
        Self {
            settings,
            registry,
            downloader,
            client,
            process: None,
            model_id: None,
            progress: None,
        }
    }

    /// Identifier of the model being served.
    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    fn report(&self, fraction: f64, text: impl Into<String>) {
        if let Some(callback) = &self.progress {
            callback(LoadProgress::new(fraction, text));
        }
    }

    fn spawn(&mut self, model: &Path) -> Result<(), LocalAIError> {
        let server_path = self.settings.binary_path();
        info!(
            "Starting llama-server on port {} with model {:?}",
            self.settings.port, model
        );

        let mut command = Command::new(&server_path);
        command
            .arg("--model")
            .arg(model)
            .arg("--host")
            .arg("127.0.0.1")
            .arg("--port")
            .arg(self.settings.port.to_string())
            .arg("--ctx-size")
            .arg(self.settings.context_size.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.settings.device == DeviceClass::Accelerated {
            command.arg("--n-gpu-layers").arg("99");
        }

        let child = command
            .spawn()
            .map_err(|e| LocalAIError::ServerStartFailed(e.to_string()))?;

        debug!("llama-server process started with PID: {}", child.id());
        self.process = Some(child);
        Ok(())
    }

    /// Wait for the server to become ready, failing early if it exits.
    async fn wait_ready(&mut self) -> Result<(), LocalAIError> {
        let start = std::time::Instant::now();
        let check_interval = Duration::from_millis(500);

        info!("Waiting for llama-server to become ready...");

        while start.elapsed() < self.settings.ready_timeout {
            match self.client.check_health().await {
                Ok(()) => {
                    info!("llama-server is ready");
                    return Ok(());
                }
                Err(_) => {
                    let exited = self
                        .process
                        .as_mut()
                        .and_then(|process| process.try_wait().ok().flatten());
                    if let Some(status) = exited {
                        self.process = None;
                        return Err(LocalAIError::ServerDied(status.to_string()));
                    }
                    sleep(check_interval).await;
                }
            }
        }

        Err(LocalAIError::ServerStartTimeout)
    }

    /// Stop the server process, giving it a grace period after SIGTERM.
    async fn stop(&mut self) {
        if let Some(mut child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());
            if terminate(&child) {
                let deadline = Instant::now() + STOP_GRACE;
                while Instant::now() < deadline {
                    match child.try_wait() {
                        Ok(None) => sleep(STOP_POLL).await,
                        _ => break,
                    }
                }
            }
            reap(child);
        }
        self.model_id = None;
    }

    /// Blocking [`Self::stop`], used from `Drop`.
    fn stop_blocking(&mut self) {
        if let Some(child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());
            if terminate(&child) {
                std::thread::sleep(STOP_GRACE);
            }
            reap(child);
        }
        self.model_id = None;
    }

    async fn load(&mut self, model_id: &str) -> Result<(), LocalAIError> {
        let model = self
            .registry
            .get_by_id(model_id)
            .ok_or_else(|| LocalAIError::ModelNotFound(model_id.to_string()))?;

        let server_path = self.settings.binary_path();
        if !server_path.exists() {
            return Err(LocalAIError::ServerBinaryNotFound(
                server_path.display().to_string(),
            ));
        }

        let callback = self.progress.clone();
        let scaled = move |p: LoadProgress| {
            if let Some(callback) = &callback {
                callback(LoadProgress::new(p.fraction * DOWNLOAD_SHARE, p.text));
            }
        };
        let weights = self.downloader.fetch(model, &scaled).await?;

        self.report(DOWNLOAD_SHARE, "Starting inference server");
        self.spawn(&weights)?;
        self.wait_ready().await?;

        self.model_id = Some(model_id.to_string());
        self.report(1.0, format!("Finish loading on {}", self.settings.device));
        Ok(())
    }
}

#[async_trait]
impl InferenceEngine for LlamaServerEngine {
    fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    async fn reload(&mut self, model_id: &str) -> Result<(), LocalAIError> {
        self.stop().await;
        let result = self.load(model_id).await;
        if result.is_err() {
            self.stop().await;
        }
        result
    }

    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<ChatCompletion, LocalAIError> {
        if self.model_id.is_none() {
            return Err(LocalAIError::NoModelLoaded);
        }
        self.client.chat_complete(messages, params).await
    }

    async fn unload(&mut self) -> Result<(), LocalAIError> {
        self.stop().await;
        Ok(())
    }
}

impl Drop for LlamaServerEngine {
    fn drop(&mut self) {
        if self.process.is_some() {
            self.stop_blocking();
        }
    }
}

/// Ask the server to shut down. Returns whether a signal was sent.
fn terminate(child: &Child) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: signalling a child we spawned and still own.
        unsafe {
            libc::kill(child.id() as i32, libc::SIGTERM);
        }
        true
    }
    #[cfg(not(unix))]
    {
        let _ = child;
        false
    }
}

/// Collect the exit status, killing the process if it is still running.
fn reap(mut child: Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!("Server exited with status: {:?}", status);
        }
        Ok(None) => {
            warn!("Server didn't exit gracefully, killing...");
            let _ = child.kill();
            let _ = child.wait();
        }
        Err(e) => {
            warn!("Error checking server status: {}", e);
            let _ = child.kill();
        }
    }
}

/// Builds [`LlamaServerEngine`]s sharing one set of settings.
#[derive(Debug, Clone)]
pub struct LlamaServerFactory {
    settings: Arc<LlamaServerSettings>,
    registry: ModelRegistry,
}

impl LlamaServerFactory {
    pub fn new(settings: LlamaServerSettings, registry: ModelRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            registry,
        }
    }

    /// Check if the server binary exists.
    pub fn binary_exists(&self) -> bool {
        self.settings.binary_path().exists()
    }
}

impl EngineFactory for LlamaServerFactory {
    fn create(&self) -> Box<dyn InferenceEngine> {
        Box::new(LlamaServerEngine::new(
            (*self.settings).clone(),
            self.registry,
        ))
    }

    fn name(&self) -> &'static str {
        "llama-server"
    }
}
