//! Job Manager - lifecycle control for simulated conversion jobs
//!
//! Owns the shared registry, one ticker task per processing job, the
//! injected history store and the optional event channel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::models::{
    AppError, AppResult, Job, JobDescriptor, JobPatch, JobStats, JobStatus,
};
use crate::core::registry::JobRegistry;
use crate::core::simulator::{spawn_ticker, SimulatorConfig};
use crate::core::store::{save_snapshot, JobStore, MemoryJobStore};

/// Events emitted by the job manager and the simulator
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum JobEvent {
    JobCreated {
        job_id: String,
        job: Job,
    },
    Started {
        job_id: String,
    },
    Progress {
        job_id: String,
        progress: f64,
    },
    Completed {
        job_id: String,
    },
    Failed {
        job_id: String,
        error: String,
    },
    Paused {
        job_id: String,
    },
    Resumed {
        job_id: String,
    },
    Cancelled {
        job_id: String,
    },
    StatsUpdated {
        stats: JobStats,
    },
}

pub type EventSender = mpsc::UnboundedSender<JobEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<JobEvent>;

pub struct JobManager {
    registry: Arc<RwLock<JobRegistry>>,

    /// Ticker task per processing job
    active_tickers: HashMap<String, JoinHandle<()>>,

    simulator: SimulatorConfig,

    store: Arc<dyn JobStore>,

    event_sender: Option<EventSender>,
}

impl JobManager {
    pub fn new(simulator: SimulatorConfig, store: Arc<dyn JobStore>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(JobRegistry::new())),
            active_tickers: HashMap::new(),
            simulator,
            store,
            event_sender: None,
        }
    }

    /// Manager whose history only lives as long as the process.
    pub fn in_memory(simulator: SimulatorConfig) -> Self {
        Self::new(simulator, Arc::new(MemoryJobStore::new()))
    }

    pub fn set_event_sender(&mut self, sender: EventSender) {
        self.event_sender = Some(sender);
    }

    pub fn has_event_sender(&self) -> bool {
        self.event_sender.is_some()
    }

    pub fn registry(&self) -> Arc<RwLock<JobRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Number of jobs that currently own a live ticker.
    pub fn active_ticker_count(&self) -> usize {
        self.active_tickers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Replace the registry contents with the persisted history.
    pub async fn hydrate(&mut self) -> AppResult<usize> {
        let snapshot = self.store.load().await?;
        self.stop_all_tickers();
        let restored = self.registry.write().await.hydrate(snapshot);
        info!("📂 Restored {} jobs from history", restored);
        Ok(restored)
    }

    /// Create a job in `processing` state and start ticking it.
    pub async fn submit(&mut self, descriptor: JobDescriptor) -> AppResult<Job> {
        validate_descriptor(&descriptor)?;

        let job = {
            let mut registry = self.registry.write().await;
            let id = registry.create(descriptor);
            registry.get(&id).cloned()
        }
        .ok_or_else(|| AppError::Internal("Job vanished right after creation".to_string()))?;

        self.emit(JobEvent::JobCreated {
            job_id: job.id.clone(),
            job: job.clone(),
        });
        self.spawn_ticker_for(&job.id);
        self.persist().await;

        info!("🎬 Submitted job {} ({})", job.id, job.title);
        Ok(job)
    }

    /// Create a job that waits in `queued` state until started.
    pub async fn enqueue(&mut self, descriptor: JobDescriptor) -> AppResult<Job> {
        validate_descriptor(&descriptor)?;

        let job = {
            let mut registry = self.registry.write().await;
            let id = registry.create(descriptor);
            registry
                .modify(&id, |job| job.status = JobStatus::Queued)
                .cloned()
        }
        .ok_or_else(|| AppError::Internal("Job vanished right after creation".to_string()))?;

        self.emit(JobEvent::JobCreated {
            job_id: job.id.clone(),
            job: job.clone(),
        });
        self.persist().await;

        info!("📥 Queued job {} ({})", job.id, job.title);
        Ok(job)
    }

    pub async fn get(&self, job_id: &str) -> Option<Job> {
        self.registry.read().await.get(job_id).cloned()
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        self.registry.read().await.list()
    }

    pub async fn stats(&self) -> JobStats {
        self.registry.read().await.stats()
    }

    /// Merge a partial update. Unknown ids are ignored and yield `None`.
    /// A status change must follow the lifecycle table.
    ///
    /// Tickers follow the resulting status: a job patched into `processing`
    /// starts ticking, a job patched out of it stops.
    pub async fn update(&mut self, job_id: &str, patch: JobPatch) -> AppResult<Option<Job>> {
        let updated = {
            let mut registry = self.registry.write().await;
            let Some(from) = registry.get(job_id).map(|job| job.status) else {
                return Ok(None);
            };
            if let Some(to) = patch.status {
                if to != from && !from.can_transition_to(to) {
                    return Err(AppError::InvalidTransition { from, to });
                }
            }
            registry.update(job_id, patch).cloned()
        };

        if let Some(job) = &updated {
            self.sync_ticker(job);
            self.persist().await;
        }
        Ok(updated)
    }

    pub async fn start(&mut self, job_id: &str) -> AppResult<Job> {
        let job = self
            .transition(job_id, &[JobStatus::Queued], JobStatus::Processing, |job| {
                job.started_at = chrono::Utc::now();
            })
            .await?;

        self.spawn_ticker_for(job_id);
        self.emit(JobEvent::Started {
            job_id: job_id.to_string(),
        });
        self.persist().await;

        info!("🔄 Started job: {}", job_id);
        Ok(job)
    }

    pub async fn pause(&mut self, job_id: &str) -> AppResult<Job> {
        let job = self
            .transition(job_id, &[JobStatus::Processing], JobStatus::Paused, |_| {})
            .await?;

        self.stop_ticker(job_id);
        self.emit(JobEvent::Paused {
            job_id: job_id.to_string(),
        });
        self.persist().await;

        info!("⏸️ Paused job: {} at {:.1}%", job_id, job.progress);
        Ok(job)
    }

    pub async fn resume(&mut self, job_id: &str) -> AppResult<Job> {
        let job = self
            .transition(job_id, &[JobStatus::Paused], JobStatus::Processing, |_| {})
            .await?;

        self.spawn_ticker_for(job_id);
        self.emit(JobEvent::Resumed {
            job_id: job_id.to_string(),
        });
        self.persist().await;

        info!("▶️ Resumed job: {}", job_id);
        Ok(job)
    }

    /// Mark a job failed. Only ever triggered from outside the simulator.
    pub async fn fail(&mut self, job_id: &str, reason: Option<String>) -> AppResult<Job> {
        let message = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Conversion failed".to_string());

        let error_message = message.clone();
        let job = self
            .transition(
                job_id,
                &[JobStatus::Queued, JobStatus::Processing, JobStatus::Paused],
                JobStatus::Failed,
                move |job| job.error_message = Some(error_message),
            )
            .await?;

        self.stop_ticker(job_id);
        self.emit(JobEvent::Failed {
            job_id: job_id.to_string(),
            error: message.clone(),
        });
        self.persist().await;

        warn!("❌ Job failed: {} - {}", job_id, message);
        Ok(job)
    }

    /// Put a failed job back into processing from zero.
    pub async fn retry(&mut self, job_id: &str) -> AppResult<Job> {
        let job = self
            .transition(job_id, &[JobStatus::Failed], JobStatus::Processing, |job| {
                job.progress = 0.0;
                job.error_message = None;
                job.completed_at = None;
                job.started_at = chrono::Utc::now();
            })
            .await?;

        self.spawn_ticker_for(job_id);
        self.emit(JobEvent::Resumed {
            job_id: job_id.to_string(),
        });
        self.persist().await;

        info!("🔁 Retrying job: {}", job_id);
        Ok(job)
    }

    /// Remove a job regardless of its status. Returns whether it existed.
    pub async fn cancel(&mut self, job_id: &str) -> AppResult<bool> {
        self.stop_ticker(job_id);
        let removed = self.registry.write().await.remove(job_id).is_some();

        if removed {
            self.emit(JobEvent::Cancelled {
                job_id: job_id.to_string(),
            });
            self.persist().await;
            info!("🚫 Cancelled job: {}", job_id);
        } else {
            debug!("Cancel ignored for unknown job {}", job_id);
        }
        Ok(removed)
    }

    pub async fn pause_all(&mut self) -> AppResult<usize> {
        let ids = self.ids_with_status(JobStatus::Processing).await;

        let mut paused = 0usize;
        for job_id in ids {
            match self.pause(&job_id).await {
                Ok(_) => paused += 1,
                Err(e) => warn!("Failed to pause job {}: {}", job_id, e),
            }
        }

        info!("Paused {} processing jobs", paused);
        Ok(paused)
    }

    pub async fn resume_all(&mut self) -> AppResult<usize> {
        let ids = self.ids_with_status(JobStatus::Paused).await;

        let mut resumed = 0usize;
        for job_id in ids {
            match self.resume(&job_id).await {
                Ok(_) => resumed += 1,
                Err(e) => warn!("Failed to resume job {}: {}", job_id, e),
            }
        }

        info!("Resumed {} paused jobs", resumed);
        Ok(resumed)
    }

    pub async fn retry_failed(&mut self) -> AppResult<usize> {
        let ids = self.ids_with_status(JobStatus::Failed).await;

        let mut retried = 0usize;
        for job_id in ids {
            match self.retry(&job_id).await {
                Ok(_) => retried += 1,
                Err(e) => warn!("Failed to retry job {}: {}", job_id, e),
            }
        }

        info!("Retried {} failed jobs", retried);
        Ok(retried)
    }

    pub async fn clear_completed(&mut self) -> AppResult<usize> {
        let cleared = self.registry.write().await.clear_completed();
        self.active_tickers.retain(|_, handle| !handle.is_finished());

        if cleared > 0 {
            self.persist().await;
            let stats = self.stats().await;
            self.emit(JobEvent::StatsUpdated { stats });
        }

        info!("🧹 Cleared {} completed jobs", cleared);
        Ok(cleared)
    }

    /// Abort every ticker and flush history. Jobs keep their status.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        info!("🛑 Stopping job manager");
        self.stop_all_tickers();
        save_snapshot(&self.registry, self.store.as_ref()).await
    }

    async fn transition<F>(
        &mut self,
        job_id: &str,
        allowed_from: &[JobStatus],
        to: JobStatus,
        mutate: F,
    ) -> AppResult<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut registry = self.registry.write().await;
        let from = registry
            .get(job_id)
            .map(|job| job.status)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;

        if !allowed_from.contains(&from) || !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        registry
            .modify(job_id, |job| {
                job.status = to;
                mutate(job);
            })
            .cloned()
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))
    }

    async fn ids_with_status(&self, status: JobStatus) -> Vec<String> {
        self.registry.read().await.ids_with_status(status)
    }

    fn sync_ticker(&mut self, job: &Job) {
        if job.status == JobStatus::Processing {
            self.spawn_ticker_for(&job.id);
        } else {
            self.stop_ticker(&job.id);
        }
    }

    fn spawn_ticker_for(&mut self, job_id: &str) {
        if let Some(handle) = self.active_tickers.get(job_id) {
            if !handle.is_finished() {
                return;
            }
        }

        let handle = spawn_ticker(
            job_id.to_string(),
            Arc::clone(&self.registry),
            self.simulator.clone(),
            self.event_sender.clone(),
            Arc::clone(&self.store),
        );
        self.active_tickers.insert(job_id.to_string(), handle);
    }

    fn stop_ticker(&mut self, job_id: &str) {
        if let Some(handle) = self.active_tickers.remove(job_id) {
            handle.abort();
        }
    }

    fn stop_all_tickers(&mut self) {
        for (_, handle) in self.active_tickers.drain() {
            handle.abort();
        }
    }

    fn emit(&self, event: JobEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }

    async fn persist(&self) {
        if let Err(e) = save_snapshot(&self.registry, self.store.as_ref()).await {
            warn!("Failed to persist job history: {}", e);
        }
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.stop_all_tickers();
    }
}

fn validate_descriptor(descriptor: &JobDescriptor) -> AppResult<()> {
    if descriptor.title.trim().is_empty() {
        return Err(AppError::Validation("Job title must not be empty".to_string()));
    }
    if descriptor.quality.trim().is_empty() {
        return Err(AppError::Validation("Job quality must not be empty".to_string()));
    }
    Ok(())
}
