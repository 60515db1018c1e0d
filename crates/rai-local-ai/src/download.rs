//! Model artifact download into the cache partition.

use futures_util::StreamExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::LoadProgress;
use crate::error::LocalAIError;
use crate::registry::ModelDescriptor;
use crate::storage::{DirCacheStorage, MODEL_CACHE_PARTITION, PARTIAL_SUFFIX};

const MIB: f64 = 1024.0 * 1024.0;

/// Fetches model weights into [`MODEL_CACHE_PARTITION`].
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    client: reqwest::Client,
    storage: DirCacheStorage,
}

impl ArtifactDownloader {
    /// Create a downloader writing under `storage`.
    pub fn new(storage: DirCacheStorage) -> Self {
        Self {
            client: reqwest::Client::new(),
            storage,
        }
    }

    /// Where the model's weight file lives once downloaded.
    pub fn artifact_path(&self, model: &ModelDescriptor) -> Result<PathBuf, LocalAIError> {
        let url = model.artifact.url();
        self.storage
            .resource_path(MODEL_CACHE_PARTITION, &url)
            .ok_or_else(|| LocalAIError::DownloadFailed(format!("invalid artifact URL: {}", url)))
    }

    /// Check if a model's weights are already on disk.
    pub fn is_downloaded(&self, model: &ModelDescriptor) -> bool {
        self.artifact_path(model)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Return the weight file, downloading it first when absent.
    ///
    /// Progress is reported as whole-percent steps. The file is written to a
    /// `.part` sibling and renamed once complete, so an interrupted download
    /// never looks cached.
    pub async fn fetch(
        &self,
        model: &ModelDescriptor,
        progress: &(dyn Fn(LoadProgress) + Send + Sync),
    ) -> Result<PathBuf, LocalAIError> {
        let dest_path = self.artifact_path(model)?;

        if dest_path.is_file() {
            debug!("Model '{}' already downloaded at {:?}", model.id, dest_path);
            progress(LoadProgress::new(1.0, format!("Found {} in cache", model.artifact.file)));
            return Ok(dest_path);
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let url = model.artifact.url();
        info!("Downloading model '{}' to {:?}", model.id, dest_path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalAIError::DownloadFailed(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        let total_size = response.content_length();
        let partial_path = PathBuf::from(format!("{}{}", dest_path.display(), PARTIAL_SUFFIX));

        let result = self
            .stream_to(response, &partial_path, total_size, model, progress)
            .await;
        if let Err(e) = result {
            let _ = fs::remove_file(&partial_path);
            return Err(e);
        }

        fs::rename(&partial_path, &dest_path)?;
        info!("Model '{}' downloaded successfully", model.id);
        Ok(dest_path)
    }

    async fn stream_to(
        &self,
        response: reqwest::Response,
        path: &Path,
        total_size: Option<u64>,
        model: &ModelDescriptor,
        progress: &(dyn Fn(LoadProgress) + Send + Sync),
    ) -> Result<(), LocalAIError> {
        let mut file = File::create(path)?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let mut last_percent = None;

        progress(LoadProgress::new(0.0, format!("Fetching {}", model.artifact.file)));

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total_size.filter(|t| *t > 0) {
                let percent = downloaded * 100 / total;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    progress(LoadProgress::new(
                        downloaded as f64 / total as f64,
                        format!(
                            "Fetching {}: {:.0}MB / {:.0}MB",
                            model.artifact.file,
                            downloaded as f64 / MIB,
                            total as f64 / MIB
                        ),
                    ));
                }
            }
        }

        file.flush()?;
        debug!("Downloaded {} bytes for {}", downloaded, model.id);
        Ok(())
    }
}
