//! Core data models for the conversion job tracker

use serde::{Deserialize, Serialize};

/// Job status enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,

    Processing,

    Paused,

    Completed,

    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Removal (cancel) is not a status and is always allowed, so it is not
    /// represented here.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Processing, Paused)
                | (Paused, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Paused, Failed)
                | (Queued, Failed)
                | (Failed, Processing)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output media kind of a conversion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Audio,

    Video,
}

impl MediaFormat {
    /// Map the wire format name (`mp3`/`mp4`) onto a media kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(MediaFormat::Audio),
            "mp4" => Some(MediaFormat::Video),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaFormat::Audio => "audio/mpeg",
            MediaFormat::Video => "video/mp4",
        }
    }
}

/// A single simulated conversion tracked for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,

    pub title: String,

    pub format: MediaFormat,

    pub quality: String,

    pub status: JobStatus,

    pub progress: f64,

    pub file_size: Option<String>,

    pub thumbnail: Option<String>,

    pub duration: Option<String>,

    pub download_url: Option<String>,

    pub error_message: Option<String>,

    pub started_at: chrono::DateTime<chrono::Utc>,

    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Build a fresh job in `processing` state from a submission.
    pub fn from_descriptor(descriptor: JobDescriptor) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: descriptor.title,
            format: descriptor.format,
            quality: descriptor.quality,
            status: JobStatus::Processing,
            progress: 0.0,
            file_size: descriptor.file_size,
            thumbnail: descriptor.thumbnail,
            duration: descriptor.duration,
            download_url: descriptor.download_url,
            error_message: None,
            started_at: now,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Merge a partial update, then restore the status/progress invariant.
    pub fn apply_patch(&mut self, patch: JobPatch) {
        let previous_status = self.status;
        let previous_progress = self.progress;

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }

        // Progress never moves backwards while processing and is frozen while paused.
        match (previous_status, self.status) {
            (JobStatus::Processing, JobStatus::Processing) => {
                self.progress = self.progress.max(previous_progress);
            }
            (JobStatus::Paused, JobStatus::Paused) => {
                self.progress = previous_progress;
            }
            _ => {}
        }

        if let Some(file_size) = patch.file_size {
            self.file_size = Some(file_size);
        }
        if let Some(download_url) = patch.download_url {
            self.download_url = Some(download_url);
        }
        if let Some(error_message) = patch.error_message {
            self.error_message = Some(error_message);
        }
        self.normalize();
    }

    /// Enforce `progress == 100` iff `status == completed`.
    pub fn normalize(&mut self) {
        let now = chrono::Utc::now();
        if !self.progress.is_finite() {
            self.progress = 0.0;
        }
        self.progress = self.progress.clamp(0.0, 100.0);

        if self.status == JobStatus::Processing && self.progress >= 100.0 {
            self.status = JobStatus::Completed;
        }

        if self.status == JobStatus::Completed {
            self.progress = 100.0;
        } else if self.progress >= 100.0 {
            self.progress = MAX_INCOMPLETE_PROGRESS;
        }

        if self.status.is_terminal() {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }

        self.updated_at = now;
    }

    /// Seconds between start and completion, for completed jobs only.
    pub fn completion_secs(&self) -> Option<f64> {
        if self.status != JobStatus::Completed {
            return None;
        }
        self.completed_at
            .map(|done| (done - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Largest progress value a job that has not completed may carry
pub const MAX_INCOMPLETE_PROGRESS: f64 = 99.9;

/// Submission payload used to create a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub title: String,

    pub format: MediaFormat,

    pub quality: String,

    #[serde(default)]
    pub file_size: Option<String>,

    #[serde(default)]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub download_url: Option<String>,
}

/// Partial update merged into an existing job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(default)]
    pub status: Option<JobStatus>,

    #[serde(default)]
    pub progress: Option<f64>,

    #[serde(default)]
    pub file_size: Option<String>,

    #[serde(default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub error_message: Option<String>,
}

/// Registry-wide statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total: usize,

    pub queued: usize,

    pub processing: usize,

    pub paused: usize,

    pub completed: usize,

    pub failed: usize,

    pub average_completion_secs: Option<f64>,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
