//! Job runtime command router.
//!
//! A thin async command queue that serializes lifecycle control calls coming
//! from HTTP handlers onto the shared job manager.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::core::manager::JobManager;
use crate::core::models::{AppError, AppResult, Job};

/// Commands understood by the runtime router.
#[derive(Debug)]
pub enum RuntimeCommand {
    Start {
        job_id: String,
        respond_to: oneshot::Sender<AppResult<Job>>,
    },
    Pause {
        job_id: String,
        respond_to: oneshot::Sender<AppResult<Job>>,
    },
    Resume {
        job_id: String,
        respond_to: oneshot::Sender<AppResult<Job>>,
    },
    Retry {
        job_id: String,
        respond_to: oneshot::Sender<AppResult<Job>>,
    },
    Fail {
        job_id: String,
        reason: Option<String>,
        respond_to: oneshot::Sender<AppResult<Job>>,
    },
    Cancel {
        job_id: String,
        respond_to: oneshot::Sender<AppResult<bool>>,
    },
    PauseAll {
        respond_to: oneshot::Sender<AppResult<usize>>,
    },
    ResumeAll {
        respond_to: oneshot::Sender<AppResult<usize>>,
    },
    RetryFailed {
        respond_to: oneshot::Sender<AppResult<usize>>,
    },
    ClearCompleted {
        respond_to: oneshot::Sender<AppResult<usize>>,
    },
}

/// Handle exposed to HTTP handlers and the rest of the backend.
#[derive(Clone)]
pub struct JobRuntimeHandle {
    sender: mpsc::Sender<RuntimeCommand>,
}

impl JobRuntimeHandle {
    pub fn new(sender: mpsc::Sender<RuntimeCommand>) -> Self {
        Self { sender }
    }

    async fn send_command<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<AppResult<T>>) -> RuntimeCommand,
    ) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| AppError::Internal(format!("Job runtime unavailable: {}", e)))?;
        rx.await
            .map_err(|_| AppError::Internal("Job runtime dropped response".into()))?
    }

    pub async fn start_job(&self, job_id: String) -> AppResult<Job> {
        self.send_command(|tx| RuntimeCommand::Start {
            job_id,
            respond_to: tx,
        })
        .await
    }

    pub async fn pause_job(&self, job_id: String) -> AppResult<Job> {
        self.send_command(|tx| RuntimeCommand::Pause {
            job_id,
            respond_to: tx,
        })
        .await
    }

    pub async fn resume_job(&self, job_id: String) -> AppResult<Job> {
        self.send_command(|tx| RuntimeCommand::Resume {
            job_id,
            respond_to: tx,
        })
        .await
    }

    pub async fn retry_job(&self, job_id: String) -> AppResult<Job> {
        self.send_command(|tx| RuntimeCommand::Retry {
            job_id,
            respond_to: tx,
        })
        .await
    }

    pub async fn fail_job(&self, job_id: String, reason: Option<String>) -> AppResult<Job> {
        self.send_command(|tx| RuntimeCommand::Fail {
            job_id,
            reason,
            respond_to: tx,
        })
        .await
    }

    pub async fn cancel_job(&self, job_id: String) -> AppResult<bool> {
        self.send_command(|tx| RuntimeCommand::Cancel {
            job_id,
            respond_to: tx,
        })
        .await
    }

    pub async fn pause_all(&self) -> AppResult<usize> {
        self.send_command(|tx| RuntimeCommand::PauseAll { respond_to: tx })
            .await
    }

    pub async fn resume_all(&self) -> AppResult<usize> {
        self.send_command(|tx| RuntimeCommand::ResumeAll { respond_to: tx })
            .await
    }

    pub async fn retry_failed(&self) -> AppResult<usize> {
        self.send_command(|tx| RuntimeCommand::RetryFailed { respond_to: tx })
            .await
    }

    pub async fn clear_completed(&self) -> AppResult<usize> {
        self.send_command(|tx| RuntimeCommand::ClearCompleted { respond_to: tx })
            .await
    }
}

/// Spawn the router loop on the current tokio runtime.
pub fn spawn_job_runtime(manager: Arc<RwLock<JobManager>>) -> (JobRuntimeHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(256);
    let router = tokio::spawn(router_loop(manager, rx));
    tracing::info!("[RUNTIME] Job runtime router spawned");
    (JobRuntimeHandle::new(tx), router)
}

async fn router_loop(manager: Arc<RwLock<JobManager>>, mut rx: mpsc::Receiver<RuntimeCommand>) {
    while let Some(cmd) = rx.recv().await {
        debug!("[RUNTIME] Processing command: {:?}", cmd);
        handle_command(&manager, cmd).await;
    }
    debug!("Job runtime channel closed, exiting router loop");
}

#[instrument(skip(manager, command))]
async fn handle_command(manager: &Arc<RwLock<JobManager>>, command: RuntimeCommand) {
    let mut guard = manager.write().await;
    match command {
        RuntimeCommand::Start { job_id, respond_to } => {
            let _ = respond_to.send(guard.start(&job_id).await);
        }
        RuntimeCommand::Pause { job_id, respond_to } => {
            let _ = respond_to.send(guard.pause(&job_id).await);
        }
        RuntimeCommand::Resume { job_id, respond_to } => {
            let _ = respond_to.send(guard.resume(&job_id).await);
        }
        RuntimeCommand::Retry { job_id, respond_to } => {
            let _ = respond_to.send(guard.retry(&job_id).await);
        }
        RuntimeCommand::Fail {
            job_id,
            reason,
            respond_to,
        } => {
            let _ = respond_to.send(guard.fail(&job_id, reason).await);
        }
        RuntimeCommand::Cancel { job_id, respond_to } => {
            let _ = respond_to.send(guard.cancel(&job_id).await);
        }
        RuntimeCommand::PauseAll { respond_to } => {
            let _ = respond_to.send(guard.pause_all().await);
        }
        RuntimeCommand::ResumeAll { respond_to } => {
            let _ = respond_to.send(guard.resume_all().await);
        }
        RuntimeCommand::RetryFailed { respond_to } => {
            let _ = respond_to.send(guard.retry_failed().await);
        }
        RuntimeCommand::ClearCompleted { respond_to } => {
            let _ = respond_to.send(guard.clear_completed().await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{JobDescriptor, JobStatus, MediaFormat};
    use crate::core::simulator::SimulatorConfig;

    fn descriptor() -> JobDescriptor {
        JobDescriptor {
            title: "10 CSS Tricks Every Developer Should Know".to_string(),
            format: MediaFormat::Video,
            quality: "720".to_string(),
            file_size: None,
            thumbnail: None,
            duration: None,
            download_url: None,
        }
    }

    #[tokio::test]
    async fn test_commands_are_routed_to_manager() -> AppResult<()> {
        let manager = Arc::new(RwLock::new(JobManager::in_memory(SimulatorConfig::default())));
        let (handle, _router) = spawn_job_runtime(Arc::clone(&manager));

        let job = manager.write().await.submit(descriptor()).await?;

        let paused = handle.pause_job(job.id.clone()).await?;
        assert_eq!(paused.status, JobStatus::Paused);

        let failed = handle.fail_job(job.id.clone(), Some("disk full".into())).await?;
        assert_eq!(failed.status, JobStatus::Failed);

        assert_eq!(handle.retry_failed().await?, 1);
        assert_eq!(handle.pause_all().await?, 1);
        assert_eq!(handle.resume_all().await?, 1);

        assert!(handle.cancel_job(job.id.clone()).await?);
        assert!(!handle.cancel_job(job.id.clone()).await?);
        assert_eq!(handle.clear_completed().await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_errors_travel_back_to_caller() {
        let manager = Arc::new(RwLock::new(JobManager::in_memory(SimulatorConfig::default())));
        let (handle, _router) = spawn_job_runtime(manager);

        assert!(matches!(
            handle.resume_job("missing".into()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stopped_router_reports_unavailable() {
        let manager = Arc::new(RwLock::new(JobManager::in_memory(SimulatorConfig::default())));
        let (handle, router) = spawn_job_runtime(manager);
        router.abort();
        let _ = router.await;

        assert!(matches!(
            handle.start_job("any".into()).await,
            Err(AppError::Internal(_))
        ));
    }
}
