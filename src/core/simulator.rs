//! Progress Simulator
//!
//! Drives the percentage of every processing job on a fixed timer using random
//! bounded increments. It has no relationship to bytes produced anywhere; it
//! only animates the lifecycle.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::artifacts::{download_path, generate_file_id};
use crate::core::manager::{EventSender, JobEvent};
use crate::core::models::JobStatus;
use crate::core::registry::JobRegistry;
use crate::core::store::{save_snapshot, JobStore};

/// Timer and increment settings for the simulator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    /// Milliseconds between two ticks
    pub tick_interval_ms: u64,
    /// Upper bound (exclusive) of the random increment added per tick
    pub max_increment: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            max_increment: 10.0,
        }
    }
}

impl SimulatorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    fn sample_increment(&self) -> f64 {
        if self.max_increment <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(0.0..self.max_increment)
    }
}

/// What a single tick did to a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Progress moved forward and the job is still processing
    Advanced(f64),
    /// Progress reached 100 and the job is now completed
    Completed,
    /// The job is gone or no longer processing; the timer should stop
    Stopped,
}

/// Apply one tick of `increment` percent to `job_id`.
pub fn advance(registry: &mut JobRegistry, job_id: &str, increment: f64) -> TickOutcome {
    let Some(job) = registry.get(job_id) else {
        return TickOutcome::Stopped;
    };
    if job.status != JobStatus::Processing {
        return TickOutcome::Stopped;
    }

    let next = (job.progress + increment.max(0.0)).min(100.0);
    let updated = registry.modify(job_id, |job| {
        if next >= 100.0 {
            job.status = JobStatus::Completed;
            job.progress = 100.0;
            if job.download_url.is_none() {
                job.download_url = Some(download_path(&generate_file_id(), job.format));
            }
        } else {
            job.progress = next;
        }
    });

    match updated {
        Some(job) if job.status == JobStatus::Completed => TickOutcome::Completed,
        Some(job) => TickOutcome::Advanced(job.progress),
        None => TickOutcome::Stopped,
    }
}

/// Spawn the ticker for one processing job.
///
/// The task ends on its own when the job completes or leaves `processing`;
/// the manager aborts it on pause, fail and cancel.
pub fn spawn_ticker(
    job_id: String,
    registry: Arc<RwLock<JobRegistry>>,
    config: SimulatorConfig,
    event_sender: Option<EventSender>,
    store: Arc<dyn JobStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let increment = config.sample_increment();
            let outcome = {
                let mut registry = registry.write().await;
                advance(&mut registry, &job_id, increment)
            };

            match outcome {
                TickOutcome::Advanced(progress) => {
                    if let Some(sender) = &event_sender {
                        let _ = sender.send(JobEvent::Progress {
                            job_id: job_id.clone(),
                            progress,
                        });
                    }
                }
                TickOutcome::Completed => {
                    info!("✅ Job completed: {}", job_id);
                    if let Some(sender) = &event_sender {
                        let _ = sender.send(JobEvent::Completed {
                            job_id: job_id.clone(),
                        });
                    }
                    if let Err(e) = save_snapshot(&registry, store.as_ref()).await {
                        warn!("Failed to persist job history after completion: {}", e);
                    }
                    break;
                }
                TickOutcome::Stopped => {
                    debug!("Ticker for job {} stopped", job_id);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{JobDescriptor, JobPatch, MediaFormat};

    fn registry_with_job() -> (JobRegistry, String) {
        let mut registry = JobRegistry::new();
        let id = registry.create(JobDescriptor {
            title: "React vs Vue: Which Framework to Choose?".to_string(),
            format: MediaFormat::Video,
            quality: "1080".to_string(),
            file_size: None,
            thumbnail: None,
            duration: None,
            download_url: None,
        });
        (registry, id)
    }

    #[test]
    fn test_advance_accumulates_progress() {
        let (mut registry, id) = registry_with_job();
        assert_eq!(advance(&mut registry, &id, 7.5), TickOutcome::Advanced(7.5));
        assert_eq!(advance(&mut registry, &id, 2.5), TickOutcome::Advanced(10.0));
        assert_eq!(registry.get(&id).unwrap().progress, 10.0);
    }

    #[test]
    fn test_advance_clamps_and_completes() {
        let (mut registry, id) = registry_with_job();
        registry.update(&id, JobPatch {
            progress: Some(95.0),
            ..Default::default()
        });

        assert_eq!(advance(&mut registry, &id, 9.0), TickOutcome::Completed);
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100.0);
        assert!(job.completed_at.is_some());
        let url = job.download_url.clone().unwrap();
        assert!(url.starts_with("/api/download/"));
        assert!(url.ends_with(".mp4"));

        // Further ticks never touch a completed job.
        assert_eq!(advance(&mut registry, &id, 9.0), TickOutcome::Stopped);
    }

    #[test]
    fn test_completion_keeps_existing_download_url() {
        let (mut registry, id) = registry_with_job();
        registry.update(&id, JobPatch {
            progress: Some(99.0),
            download_url: Some("/api/download/1700000000000-abcdefghi.mp4".to_string()),
            ..Default::default()
        });

        assert_eq!(advance(&mut registry, &id, 5.0), TickOutcome::Completed);
        assert_eq!(
            registry.get(&id).unwrap().download_url.as_deref(),
            Some("/api/download/1700000000000-abcdefghi.mp4")
        );
    }

    #[test]
    fn test_advance_skips_paused_and_missing_jobs() {
        let (mut registry, id) = registry_with_job();
        registry.update(&id, JobPatch {
            progress: Some(30.0),
            status: Some(JobStatus::Paused),
            ..Default::default()
        });

        assert_eq!(advance(&mut registry, &id, 5.0), TickOutcome::Stopped);
        assert_eq!(registry.get(&id).unwrap().progress, 30.0);
        assert_eq!(advance(&mut registry, "missing", 5.0), TickOutcome::Stopped);
    }

    #[test]
    fn test_sample_increment_is_bounded() {
        let config = SimulatorConfig::default();
        for _ in 0..1000 {
            let increment = config.sample_increment();
            assert!((0.0..10.0).contains(&increment));
        }
    }
}
