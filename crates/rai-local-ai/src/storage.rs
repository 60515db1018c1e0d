//! Partitioned artifact storage.
//!
//! Artifacts are grouped into named partitions, and every stored resource is
//! addressed by the URL it was fetched from. Inference backends manage their
//! own partitions; the rest of the crate only ever sees names and URLs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::StorageError;

/// Partition the artifact downloader writes to.
pub const MODEL_CACHE_PARTITION: &str = "rai-model-cache";

/// Suffix of in-flight downloads, never reported as a stored resource.
pub(crate) const PARTIAL_SUFFIX: &str = ".part";

/// Whether a partition follows the model/engine naming convention.
pub fn is_model_partition(name: &str) -> bool {
    name.contains("webllm") || name.contains("model")
}

/// Key/value store of partitions holding URL-addressed resources.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of every partition.
    async fn partition_names(&self) -> Result<Vec<String>, StorageError>;

    /// URLs of the resources stored in a partition.
    async fn resource_urls(&self, partition: &str) -> Result<Vec<String>, StorageError>;

    /// Body length of a stored resource, `None` if it is not stored.
    async fn resource_size(&self, partition: &str, url: &str)
        -> Result<Option<u64>, StorageError>;

    /// Delete a partition. Returns whether it existed.
    async fn delete_partition(&self, partition: &str) -> Result<bool, StorageError>;
}

/// Filesystem-backed storage: one directory per partition.
///
/// A resource fetched from `https://host/a/b` lives at `<root>/<partition>/host/a/b`.
#[derive(Debug, Clone)]
pub struct DirCacheStorage {
    root: PathBuf,
}

impl DirCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location for a resource URL, `None` for URLs that would
    /// escape the partition.
    pub fn resource_path(&self, partition: &str, url: &str) -> Option<PathBuf> {
        let relative = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let relative = Path::new(relative);

        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || partition.is_empty() || partition.contains(|c| c == '/' || c == '\\') {
            return None;
        }

        Some(self.root.join(partition).join(relative))
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(partition)
    }
}

#[async_trait]
impl CacheStorage for DirCacheStorage {
    async fn partition_names(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn resource_urls(&self, partition: &str) -> Result<Vec<String>, StorageError> {
        let base = self.partition_dir(partition);
        if !base.is_dir() {
            return Ok(vec![]);
        }

        let mut urls = Vec::new();
        for entry in WalkDir::new(&base).min_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.to_string_lossy().ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&base) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                urls.push(format!("https://{}", parts.join("/")));
            }
        }
        urls.sort();
        Ok(urls)
    }

    async fn resource_size(
        &self,
        partition: &str,
        url: &str,
    ) -> Result<Option<u64>, StorageError> {
        let Some(path) = self.resource_path(partition, url) else {
            return Ok(None);
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, StorageError> {
        let dir = self.partition_dir(partition);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!("Removed cache partition {:?}", dir);
        Ok(true)
    }
}

/// In-memory storage, used by the simulated engine and tests.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    partitions: Mutex<BTreeMap<String, BTreeMap<String, u64>>>,
    unavailable: AtomicBool,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resource of `size` bytes, creating the partition if needed.
    pub fn insert(&self, partition: &str, url: &str, size: u64) -> Result<(), StorageError> {
        self.partitions()?
            .entry(partition.to_string())
            .or_default()
            .insert(url.to_string(), size);
        Ok(())
    }

    /// Make every subsequent call fail, as a revoked storage quota would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn partitions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, BTreeMap<String, u64>>>, StorageError>
    {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("cache storage is disabled".into()));
        }
        self.partitions
            .lock()
            .map_err(|_| StorageError::Unavailable("cache storage lock poisoned".into()))
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn partition_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.partitions()?.keys().cloned().collect())
    }

    async fn resource_urls(&self, partition: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .partitions()?
            .get(partition)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn resource_size(
        &self,
        partition: &str,
        url: &str,
    ) -> Result<Option<u64>, StorageError> {
        Ok(self
            .partitions()?
            .get(partition)
            .and_then(|p| p.get(url).copied()))
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, StorageError> {
        Ok(self.partitions()?.remove(partition).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partition_naming_convention() {
        assert!(is_model_partition("webllm/model"));
        assert!(is_model_partition(MODEL_CACHE_PARTITION));
        assert!(is_model_partition("webllm-config"));
        assert!(!is_model_partition("avatar-assets"));
    }

    #[test]
    fn test_resource_path_rejects_traversal() {
        let storage = DirCacheStorage::new("/tmp/cache");
        assert!(storage
            .resource_path("p", "https://host/../../etc/passwd")
            .is_none());
        assert!(storage.resource_path("../p", "https://host/a").is_none());
        assert_eq!(
            storage.resource_path("p", "https://host/a/b.gguf"),
            Some(PathBuf::from("/tmp/cache/p/host/a/b.gguf"))
        );
    }

    #[tokio::test]
    async fn test_dir_storage_lists_urls_and_sizes() {
        let dir = tempdir().unwrap();
        let storage = DirCacheStorage::new(dir.path());
        let url = "https://huggingface.co/repo/resolve/main/model.gguf";

        let path = storage.resource_path(MODEL_CACHE_PARTITION, url).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![0u8; 128]).unwrap();
        fs::write(format!("{}{}", path.display(), PARTIAL_SUFFIX), b"partial").unwrap();

        assert_eq!(
            storage.partition_names().await.unwrap(),
            vec![MODEL_CACHE_PARTITION.to_string()]
        );
        assert_eq!(
            storage.resource_urls(MODEL_CACHE_PARTITION).await.unwrap(),
            vec![url.to_string()]
        );
        assert_eq!(
            storage
                .resource_size(MODEL_CACHE_PARTITION, url)
                .await
                .unwrap(),
            Some(128)
        );
    }

    #[tokio::test]
    async fn test_dir_storage_walks_nested_resources() {
        let dir = tempdir().unwrap();
        let storage = DirCacheStorage::new(dir.path());
        let urls = [
            "https://host/llama-3.2-1b/shard1",
            "https://host/llama-3.2-1b/weights/part/shard2",
            "https://other/config.json",
        ];
        for url in urls {
            let path = storage.resource_path("webllm-model", url).unwrap();
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"x").unwrap();
        }
        fs::create_dir_all(dir.path().join("webllm-model/host/empty")).unwrap();

        let mut expected: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        expected.sort();
        assert_eq!(storage.resource_urls("webllm-model").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_dir_storage_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let storage = DirCacheStorage::new(dir.path().join("absent"));
        assert!(storage.partition_names().await.unwrap().is_empty());
        assert!(!storage.delete_partition("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage_delete() {
        let storage = MemoryCacheStorage::new();
        storage.insert("webllm/model", "https://x/y", 10).unwrap();
        assert!(storage.delete_partition("webllm/model").await.unwrap());
        assert!(!storage.delete_partition("webllm/model").await.unwrap());
        assert!(storage.partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_storage_unavailable() {
        let storage = MemoryCacheStorage::new();
        storage.set_unavailable(true);
        assert!(storage.partition_names().await.is_err());
    }
}
