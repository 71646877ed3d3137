//! Job history persistence
//!
//! The registry never touches storage directly; a `JobStore` is injected into
//! the manager, which saves a snapshot after every mutation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::core::models::{AppResult, Job};
use crate::core::registry::JobRegistry;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load the persisted jobs, newest first.
    async fn load(&self) -> AppResult<Vec<Job>>;

    /// Replace the persisted history with `jobs` (newest first).
    async fn save(&self, jobs: &[Job]) -> AppResult<()>;
}

/// Keeps the last snapshot in memory only
#[derive(Default)]
pub struct MemoryJobStore {
    snapshot: Mutex<Vec<Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn load(&self) -> AppResult<Vec<Job>> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, jobs: &[Job]) -> AppResult<()> {
        *self.snapshot.lock().await = jobs.to_vec();
        Ok(())
    }
}

/// Save the current registry contents to `store`.
///
/// The read guard is held until the store returns, so no mutation can slip in
/// between two concurrent saves and the last file written is always current.
pub async fn save_snapshot(registry: &RwLock<JobRegistry>, store: &dyn JobStore) -> AppResult<()> {
    let registry = registry.read().await;
    store.save(&registry.snapshot()).await
}

/// Pretty-printed JSON file on disk
///
/// Saves are serialized and land through a temporary sibling file that is
/// renamed over the history, so readers never observe a partial write.
pub struct JsonFileJobStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("history.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl JobStore for JsonFileJobStore {
    async fn load(&self) -> AppResult<Vec<Job>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let jobs: Vec<Job> = serde_json::from_str(&contents)?;
                debug!("Loaded {} jobs from {:?}", jobs.len(), self.path);
                Ok(jobs)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, jobs: &[Job]) -> AppResult<()> {
        let json = serde_json::to_string_pretty(jobs)?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;
        debug!("Saved {} jobs to {:?}", jobs.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{JobDescriptor, MediaFormat};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_job(title: &str) -> Job {
        Job::from_descriptor(JobDescriptor {
            title: title.to_string(),
            format: MediaFormat::Video,
            quality: "720".to_string(),
            file_size: Some("45.7 MB".to_string()),
            thumbnail: None,
            duration: None,
            download_url: None,
        })
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() -> AppResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileJobStore::new(temp_dir.path().join("nested").join("history.json"));

        assert!(store.load().await?.is_empty());

        let jobs = vec![sample_job("second"), sample_job("first")];
        store.save(&jobs).await?;

        let loaded = store.load().await?;
        assert_eq!(loaded, jobs);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileJobStore::new(&path);
        assert!(store.load().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_leave_a_readable_file() -> AppResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileJobStore::new(temp_dir.path().join("history.json")));

        let small = vec![sample_job("only")];
        let large: Vec<Job> = (0..40).map(|i| sample_job(&format!("job {i}"))).collect();

        for _ in 0..50 {
            let first = {
                let store = Arc::clone(&store);
                let jobs = small.clone();
                tokio::spawn(async move { store.save(&jobs).await })
            };
            let second = {
                let store = Arc::clone(&store);
                let jobs = large.clone();
                tokio::spawn(async move { store.save(&jobs).await })
            };
            first.await.unwrap()?;
            second.await.unwrap()?;

            let loaded = store.load().await?;
            assert!(loaded == small || loaded == large);
        }

        assert!(!temp_dir.path().join("history.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_snapshot_writes_registry_contents() -> AppResult<()> {
        let registry = RwLock::new(JobRegistry::new());
        let id = registry.write().await.create(JobDescriptor {
            title: "snapshot".to_string(),
            format: MediaFormat::Audio,
            quality: "128".to_string(),
            file_size: None,
            thumbnail: None,
            duration: None,
            download_url: None,
        });

        let store = MemoryJobStore::new();
        save_snapshot(&registry, &store).await?;

        let saved = store.load().await?;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, id);
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_keeps_last_snapshot() -> AppResult<()> {
        let store = MemoryJobStore::new();
        store.save(&[sample_job("a")]).await?;
        store.save(&[sample_job("b"), sample_job("c")]).await?;
        assert_eq!(store.load().await?.len(), 2);
        Ok(())
    }
}
