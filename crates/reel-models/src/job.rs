//! Job records and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::voice::Avatar;

/// Unique identifier for a render job.
///
/// Callers supply their own ids (the id doubles as the output video name),
/// but a random one can be generated for tests and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a worker slot
    #[default]
    Pending,
    /// Job has been claimed and is being rendered
    Running,
    /// Job completed successfully
    Done,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Check if a job in this state blocks re-submission of the same id.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller preferences for the rendered video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Burn word-highlighted subtitles into the video
    pub subtitles: bool,
    /// Narration voice
    pub avatar: Avatar,
    /// Try to animate resolved still images into short clips
    #[serde(default)]
    pub animate_stills: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            subtitles: true,
            avatar: Avatar::default(),
            animate_stills: false,
        }
    }
}

/// Request payload for one render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderParams {
    /// Script to narrate
    pub script: String,
    /// Rendering preferences
    #[serde(default)]
    pub preferences: Preferences,
    /// Free-form content classification from the caller
    #[serde(default)]
    pub content_class: String,
    /// Caller-side video identifier, defaults to the job id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl RenderParams {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            preferences: Preferences::default(),
            content_class: String::new(),
            video_id: None,
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Durable record of one job's lifecycle.
///
/// Created at submission, mutated by the worker loop (claim, terminal
/// state) and by the owning pipeline (progress, status message), purged by
/// age once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job ID (caller supplied, unique while active)
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100, monotonic within a job)
    pub progress: u8,
    /// Human-readable description of the current step
    pub status_message: String,
    /// Output video path, present once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error message, present iff failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
    /// When a worker claimed the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Request payload
    pub params: RenderParams,
}

impl JobRecord {
    /// Create a fresh pending record.
    pub fn new(id: JobId, params: RenderParams) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            status_message: "Queued...".to_string(),
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            params,
        }
    }

    /// Check if the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a partial update, merging present fields.
    ///
    /// Progress is clamped so it never regresses; `finished_at` is stamped
    /// automatically when the update carries a terminal status.
    pub fn apply(&mut self, update: JobUpdate) {
        if let Some(status) = update.status {
            if status.is_terminal() && self.finished_at.is_none() {
                self.finished_at = Some(Utc::now());
            }
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100).max(self.progress);
        }
        if let Some(message) = update.status_message {
            self.status_message = message;
        }
        if let Some(result) = update.result {
            self.result = Some(result);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(started_at) = update.started_at {
            self.started_at = Some(started_at);
        }
    }
}

/// Partial update merged atomically into a [`JobRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    /// Update marking the job as claimed by a worker.
    pub fn claimed() -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(Utc::now()),
            progress: Some(0),
            status_message: Some("Worker picked up job...".to_string()),
            ..Default::default()
        }
    }

    /// Progress/status-message update from the running pipeline.
    pub fn progress(progress: u8, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            status_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Terminal success update.
    pub fn done(result: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            progress: Some(100),
            status_message: Some("Video generated successfully".to_string()),
            result: Some(result.into()),
            ..Default::default()
        }
    }

    /// Terminal failure update.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            status_message: Some("Rendering failed".to_string()),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut record = JobRecord::new(JobId::from_string("job-1"), RenderParams::new("hello"));
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.status.is_active());

        record.apply(JobUpdate::claimed());
        assert_eq!(record.status, JobStatus::Running);
        assert!(record.started_at.is_some());
        assert!(record.finished_at.is_none());

        record.apply(JobUpdate::done("video-job-1.mp4"));
        assert_eq!(record.status, JobStatus::Done);
        assert_eq!(record.progress, 100);
        assert!(record.finished_at.is_some());
        assert!(record.is_terminal());
    }

    #[test]
    fn test_progress_never_regresses() {
        let mut record = JobRecord::new(JobId::new(), RenderParams::new("hello"));
        record.apply(JobUpdate::progress(40, "resolving visuals"));
        assert_eq!(record.progress, 40);

        record.apply(JobUpdate::progress(20, "late update"));
        assert_eq!(record.progress, 40);
        assert_eq!(record.status_message, "late update");
    }

    #[test]
    fn test_failed_records_error() {
        let mut record = JobRecord::new(JobId::new(), RenderParams::new("hello"));
        record.apply(JobUpdate::claimed());
        record.apply(JobUpdate::failed("speech synthesis failed"));
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("speech synthesis failed"));
        assert!(record.finished_at.is_some());
    }
}
