//! Best-effort inspection of cached model artifacts.
//!
//! Backends keep their weights in storage partitions they manage themselves,
//! so the only observable signal is the set of stored resource URLs. Model
//! detection is therefore a substring heuristic, not an index lookup.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::storage::{is_model_partition, CacheStorage};

/// Snapshot of the artifact cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInspection {
    /// At least one stored resource was found.
    pub model_cached: bool,
    /// Sum of the body lengths of every stored resource.
    pub total_bytes: u64,
}

/// Read-only view over model partitions, plus the clear operation.
#[derive(Clone)]
pub struct ArtifactCacheInspector {
    storage: Arc<dyn CacheStorage>,
}

impl ArtifactCacheInspector {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Whether any stored URL mentions `model_id`.
    ///
    /// Storage failures are logged and reported as "not cached".
    pub async fn is_model_cached(&self, model_id: &str) -> bool {
        match self.find_model(model_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Error checking cache for model {}: {}", model_id, e);
                false
            }
        }
    }

    /// Total size of every model partition.
    ///
    /// Storage failures are logged and reported as an empty cache.
    pub async fn aggregate_cache_size(&self) -> CacheInspection {
        match self.measure().await {
            Ok(inspection) => {
                if inspection.model_cached {
                    info!(
                        "Found cached models: {:.2} GB",
                        inspection.total_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
                    );
                } else {
                    debug!("No cached models found");
                }
                inspection
            }
            Err(e) => {
                warn!("Error measuring model cache: {}", e);
                CacheInspection::default()
            }
        }
    }

    /// Delete every model partition. Returns how many were removed.
    ///
    /// Partitions that fail to delete are logged and skipped.
    pub async fn clear(&self) -> usize {
        let names = match self.model_partitions().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Error listing model cache partitions: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for name in names {
            match self.storage.delete_partition(&name).await {
                Ok(true) => {
                    info!("Deleted cache: {}", name);
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!("Error deleting cache {}: {}", name, e),
            }
        }
        removed
    }

    async fn model_partitions(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .storage
            .partition_names()
            .await?
            .into_iter()
            .filter(|name| is_model_partition(name))
            .collect())
    }

    async fn find_model(&self, model_id: &str) -> Result<bool, StorageError> {
        for partition in self.model_partitions().await? {
            for url in self.storage.resource_urls(&partition).await? {
                if url_mentions_model(&url, model_id) {
                    debug!("Found cached files for model {}: {}", model_id, url);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn measure(&self) -> Result<CacheInspection, StorageError> {
        let mut inspection = CacheInspection::default();
        for partition in self.model_partitions().await? {
            for url in self.storage.resource_urls(&partition).await? {
                if let Some(size) = self.storage.resource_size(&partition, &url).await? {
                    inspection.total_bytes += size;
                    inspection.model_cached = true;
                }
            }
        }
        Ok(inspection)
    }
}

/// Exact, lower-cased, and `-`→`_` normalized substring match.
pub(crate) fn url_mentions_model(url: &str, model_id: &str) -> bool {
    url.contains(model_id)
        || url.contains(&model_id.to_lowercase())
        || url.contains(&model_id.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCacheStorage;

    fn inspector_with(storage: MemoryCacheStorage) -> (ArtifactCacheInspector, Arc<MemoryCacheStorage>) {
        let storage = Arc::new(storage);
        (ArtifactCacheInspector::new(storage.clone()), storage)
    }

    #[test]
    fn test_url_match_variants() {
        assert!(url_mentions_model("https://h/Llama-3.2-1B/x", "Llama-3.2-1B"));
        assert!(url_mentions_model("https://h/llama-3.2-1b/x", "Llama-3.2-1B"));
        assert!(url_mentions_model("https://h/Llama_3.2_1B/x", "Llama-3.2-1B"));
        assert!(!url_mentions_model("https://h/gemma/x", "Llama-3.2-1B"));
    }

    #[tokio::test]
    async fn test_case_insensitive_model_detection() {
        let storage = MemoryCacheStorage::new();
        storage
            .insert("webllm/model", "https://hf.co/mlc-ai/llama-3.2-1b/shard1", 1024)
            .unwrap();
        let (inspector, _) = inspector_with(storage);

        assert!(inspector.is_model_cached("Llama-3.2-1B").await);
        assert!(!inspector.is_model_cached("gemma-2-2b").await);
    }

    #[tokio::test]
    async fn test_ignores_unrelated_partitions() {
        let storage = MemoryCacheStorage::new();
        storage
            .insert("avatar-assets", "https://cdn/llama-3.2-1b.png", 50)
            .unwrap();
        let (inspector, _) = inspector_with(storage);

        assert!(!inspector.is_model_cached("Llama-3.2-1B").await);
        assert_eq!(inspector.aggregate_cache_size().await, CacheInspection::default());
    }

    #[tokio::test]
    async fn test_aggregate_size_sums_partitions() {
        let storage = MemoryCacheStorage::new();
        storage.insert("webllm/model", "https://a/1", 100).unwrap();
        storage.insert("webllm/model", "https://a/2", 200).unwrap();
        storage.insert("rai-model-cache", "https://b/1", 300).unwrap();
        let (inspector, _) = inspector_with(storage);

        let inspection = inspector.aggregate_cache_size().await;
        assert!(inspection.model_cached);
        assert_eq!(inspection.total_bytes, 600);
    }

    #[tokio::test]
    async fn test_storage_failure_is_swallowed() {
        let storage = MemoryCacheStorage::new();
        storage.insert("webllm/model", "https://a/llama", 100).unwrap();
        storage.set_unavailable(true);
        let (inspector, _) = inspector_with(storage);

        assert!(!inspector.is_model_cached("llama").await);
        assert_eq!(inspector.aggregate_cache_size().await, CacheInspection::default());
        assert_eq!(inspector.clear().await, 0);
    }

    #[tokio::test]
    async fn test_clear_removes_only_model_partitions() {
        let storage = MemoryCacheStorage::new();
        storage.insert("webllm/model", "https://a/1", 100).unwrap();
        storage.insert("settings", "https://a/2", 1).unwrap();
        let (inspector, storage) = inspector_with(storage);

        assert_eq!(inspector.clear().await, 1);
        assert_eq!(
            storage.partition_names().await.unwrap(),
            vec!["settings".to_string()]
        );
        assert_eq!(inspector.clear().await, 0);
    }
}
