//! Tube Converter - Core Library
//!
//! This library provides a YouTube to MP3/MP4 conversion demo service:
//! simulated conversion jobs with a pause/resume lifecycle, mock video
//! metadata and synthetic media files served over HTTP.

pub mod commands;
pub mod core;
pub mod server;
pub mod utils;

// Re-export commonly used types
pub use core::{
    config::AppConfig,
    converter::ConversionService,
    manager::{EventReceiver, EventSender, JobEvent, JobManager},
    models::{AppError, AppResult, Job, JobDescriptor, JobPatch, JobStats, JobStatus, MediaFormat},
    runtime::{spawn_job_runtime, JobRuntimeHandle},
    store::{JobStore, JsonFileJobStore, MemoryJobStore},
};

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Application state shared between HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub job_manager: Arc<RwLock<JobManager>>,
    pub conversion: Arc<ConversionService>,
    pub job_runtime: JobRuntimeHandle,
}

impl AppState {
    /// Build the state from `config`, restore job history and start the
    /// command router. Must be called from within a tokio runtime.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        Self::build(config, None).await
    }

    /// Like [`AppState::new`], also returning the receiving end of the job
    /// event channel.
    pub async fn with_events(config: AppConfig) -> anyhow::Result<(Self, EventReceiver)> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Self::build(config, Some(sender)).await?;
        Ok((state, receiver))
    }

    async fn build(config: AppConfig, event_sender: Option<EventSender>) -> anyhow::Result<Self> {
        let store: Arc<dyn JobStore> = match &config.storage.history_file {
            Some(path) => {
                tracing::info!("📁 Job history file: {:?}", path);
                Arc::new(JsonFileJobStore::new(path.clone()))
            }
            None => Arc::new(MemoryJobStore::new()),
        };

        let mut manager = JobManager::new(config.simulator.clone(), store);
        if let Some(sender) = event_sender {
            manager.set_event_sender(sender);
        }
        if let Err(e) = manager.hydrate().await {
            tracing::warn!("Failed to restore job history: {}. Starting empty", e);
        }

        let job_manager = Arc::new(RwLock::new(manager));
        let (job_runtime, _router) = spawn_job_runtime(Arc::clone(&job_manager));
        let conversion = Arc::new(ConversionService::new(config.conversion.clone()));

        Ok(Self {
            job_manager,
            conversion,
            job_runtime,
        })
    }

    /// Load configuration from disk, falling back to defaults when it is
    /// missing or invalid.
    pub fn load_or_initialize_config() -> AppConfig {
        match AppConfig::load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {:#}. Using defaults",
                    err
                );
                AppConfig::default()
            }
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with default settings
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing();
    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "tube-converter");
    }

    #[tokio::test]
    async fn test_state_restores_history_file() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let history = temp_dir.path().join("history.json");

        let mut config = AppConfig::default();
        config.storage.history_file = Some(history.clone());

        {
            let state = AppState::new(config.clone()).await?;
            let descriptor = JobDescriptor {
                title: "Complete JavaScript Tutorial for Beginners".to_string(),
                format: MediaFormat::Audio,
                quality: "192".to_string(),
                file_size: Some("4.6 MB".to_string()),
                thumbnail: None,
                duration: Some("45:12".to_string()),
                download_url: None,
            };
            state.job_manager.write().await.submit(descriptor).await?;
        }
        assert!(history.exists());

        let (state, _events) = AppState::with_events(config).await?;
        let jobs = state.job_manager.read().await.list().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Paused);
        Ok(())
    }
}
