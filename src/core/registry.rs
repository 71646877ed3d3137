//! Job Registry
//!
//! In-memory collection of conversion jobs keyed by id. Unknown ids on
//! `update`/`remove` are silently ignored.

use std::collections::HashMap;
use tracing::debug;

use crate::core::models::{Job, JobDescriptor, JobPatch, JobStats, JobStatus};

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Job>,
    /// Insertion order, oldest first
    order: Vec<String>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new job in `processing` state and return its id.
    pub fn create(&mut self, descriptor: JobDescriptor) -> String {
        let job = Job::from_descriptor(descriptor);
        let id = job.id.clone();
        debug!("Registered job {} ({})", id, job.title);
        self.order.push(id.clone());
        self.jobs.insert(id.clone(), job);
        id
    }

    /// Merge `patch` into the job. Returns the updated job, or `None` when the
    /// id is unknown.
    pub fn update(&mut self, id: &str, patch: JobPatch) -> Option<&Job> {
        let job = self.jobs.get_mut(id)?;
        job.apply_patch(patch);
        Some(job)
    }

    /// Apply an arbitrary mutation followed by normalization.
    pub(crate) fn modify<F>(&mut self, id: &str, f: F) -> Option<&Job>
    where
        F: FnOnce(&mut Job),
    {
        let job = self.jobs.get_mut(id)?;
        f(job);
        job.normalize();
        Some(job)
    }

    pub fn remove(&mut self, id: &str) -> Option<Job> {
        let removed = self.jobs.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.jobs.get(id).cloned())
            .collect()
    }

    /// Persistable copy of every job in the order `hydrate` expects.
    pub fn snapshot(&self) -> Vec<Job> {
        self.list()
    }

    pub fn ids_with_status(&self, status: JobStatus) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| {
                self.jobs
                    .get(id.as_str())
                    .is_some_and(|job| job.status == status)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop every completed job and return how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.status != JobStatus::Completed);
        let jobs = &self.jobs;
        self.order.retain(|id| jobs.contains_key(id));
        before - self.jobs.len()
    }

    pub fn stats(&self) -> JobStats {
        let mut stats = JobStats {
            total: self.jobs.len(),
            ..Default::default()
        };

        let mut completion_total = 0.0;
        let mut completion_count = 0usize;

        for job in self.jobs.values() {
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Paused => stats.paused += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
            if let Some(secs) = job.completion_secs() {
                completion_total += secs;
                completion_count += 1;
            }
        }

        if completion_count > 0 {
            stats.average_completion_secs = Some(completion_total / completion_count as f64);
        }
        stats
    }

    /// Replace the contents with a persisted snapshot (newest first).
    ///
    /// Jobs that were processing come back paused: their timers did not
    /// survive the restart.
    pub fn hydrate(&mut self, snapshot: Vec<Job>) -> usize {
        self.jobs.clear();
        self.order.clear();

        for mut job in snapshot.into_iter().rev() {
            if job.status == JobStatus::Processing {
                job.status = JobStatus::Paused;
            }
            job.normalize();
            if self.jobs.contains_key(&job.id) {
                continue;
            }
            self.order.push(job.id.clone());
            self.jobs.insert(job.id.clone(), job);
        }
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::MediaFormat;

    fn descriptor(title: &str) -> JobDescriptor {
        JobDescriptor {
            title: title.to_string(),
            format: MediaFormat::Audio,
            quality: "192".to_string(),
            file_size: None,
            thumbnail: None,
            duration: None,
            download_url: None,
        }
    }

    #[test]
    fn test_create_and_list_newest_first() {
        let mut registry = JobRegistry::new();
        let first = registry.create(descriptor("first"));
        let second = registry.create(descriptor("second"));
        let third = registry.create(descriptor("third"));

        let ids: Vec<String> = registry.list().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut registry = JobRegistry::new();
        registry.create(descriptor("only"));

        assert!(registry
            .update("missing", JobPatch {
                progress: Some(50.0),
                ..Default::default()
            })
            .is_none());
        assert!(registry.remove("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut registry = JobRegistry::new();
        let id = registry.create(descriptor("merge"));

        let job = registry
            .update(&id, JobPatch {
                progress: Some(33.0),
                download_url: Some("/api/download/1-abc.mp3".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(job.progress, 33.0);
        assert_eq!(job.title, "merge");
        assert_eq!(job.download_url.as_deref(), Some("/api/download/1-abc.mp3"));
    }

    #[test]
    fn test_clear_completed_keeps_others() {
        let mut registry = JobRegistry::new();
        let done = registry.create(descriptor("done"));
        let running = registry.create(descriptor("running"));
        registry.update(&done, JobPatch {
            status: Some(JobStatus::Completed),
            ..Default::default()
        });

        assert_eq!(registry.clear_completed(), 1);
        assert!(!registry.contains(&done));
        assert!(registry.contains(&running));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_stats_counts_by_status() {
        let mut registry = JobRegistry::new();
        let a = registry.create(descriptor("a"));
        let b = registry.create(descriptor("b"));
        registry.create(descriptor("c"));
        registry.update(&a, JobPatch {
            status: Some(JobStatus::Completed),
            ..Default::default()
        });
        registry.update(&b, JobPatch {
            status: Some(JobStatus::Failed),
            ..Default::default()
        });

        let stats = registry.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processing, 1);
        assert!(stats.average_completion_secs.is_some());
    }

    #[test]
    fn test_hydrate_pauses_processing_jobs() {
        let mut source = JobRegistry::new();
        let old = source.create(descriptor("old"));
        let new = source.create(descriptor("new"));
        source.update(&old, JobPatch {
            progress: Some(25.0),
            ..Default::default()
        });

        let mut registry = JobRegistry::new();
        assert_eq!(registry.hydrate(source.snapshot()), 2);

        let listed = registry.list();
        assert_eq!(listed[0].id, new);
        assert_eq!(listed[1].id, old);
        assert!(listed.iter().all(|job| job.status == JobStatus::Paused));
        assert_eq!(registry.get(&old).unwrap().progress, 25.0);
    }
}
