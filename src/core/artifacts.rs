//! In-memory store for converted files awaiting download

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::models::MediaFormat;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A converted file held for later download
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_id: String,
    pub format: MediaFormat,
    /// Human readable name offered in `Content-Disposition`
    pub filename: String,
    pub data: Bytes,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Route serving the artifact, e.g. `/api/download/1718000000000-k3j9x0abc.mp3`.
    pub fn download_path(&self) -> String {
        download_path(&self.file_id, self.format)
    }
}

/// Route serving `file_id`; unknown ids get a freshly synthesized file.
pub fn download_path(file_id: &str, format: MediaFormat) -> String {
    format!("/api/download/{}.{}", file_id, format.extension())
}

/// `{unix millis}-{9 random base36 chars}`
pub fn generate_file_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub struct ArtifactStore {
    artifacts: DashMap<String, Artifact>,
    ttl: Duration,
}

impl ArtifactStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            artifacts: DashMap::new(),
            ttl,
        }
    }

    /// Store `data` under a fresh file id and return the stored record.
    pub fn insert(&self, format: MediaFormat, filename: String, data: Bytes) -> Artifact {
        let artifact = Artifact {
            file_id: generate_file_id(),
            format,
            filename,
            data,
            created_at: Utc::now(),
        };
        self.artifacts
            .insert(artifact.file_id.clone(), artifact.clone());
        artifact
    }

    /// Look up a live artifact by id. Expired entries are treated as absent.
    pub fn get(&self, file_id: &str) -> Option<Artifact> {
        let artifact = self.artifacts.get(file_id)?.clone();
        if self.is_expired(&artifact, Utc::now()) {
            return None;
        }
        Some(artifact)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Drop every artifact older than the TTL and return how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now())
    }

    fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.artifacts.len();
        self.artifacts
            .retain(|_, artifact| !self.is_expired(artifact, now));
        let removed = before.saturating_sub(self.artifacts.len());
        if removed > 0 {
            debug!("Dropped {} expired artifacts", removed);
        }
        removed
    }

    fn is_expired(&self, artifact: &Artifact, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::milliseconds(self.ttl.as_millis().min(i64::MAX as u128) as i64);
        now.signed_duration_since(artifact.created_at) > ttl
    }
}

/// Periodically drop expired artifacts until the returned task is aborted.
pub fn spawn_sweeper(store: Arc<ArtifactStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            store.cleanup_expired();
        }
    })
}
