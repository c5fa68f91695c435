//! Job status document for progress tracking and polling.
//!
//! This is the shape stored in the job status sink (Redis, 24h TTL) and
//! served to the polling status API. The worker is the only writer for a
//! given job id; concurrent writers are a caller error.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Queued,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
    /// Worker stopped responding (stale)
    Stale,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Stale => "stale",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stale
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable job status snapshot for polling queries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusCache {
    /// Unique job identifier
    pub job_id: String,
    /// Project the job belongs to
    pub project_id: String,
    /// User who owns this job
    pub user_id: String,
    /// Current job status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Current pipeline stage description
    pub current_step: Option<String>,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// Final result payload for completed jobs
    pub result: Option<serde_json::Value>,
    /// When the job was started
    pub started_at: DateTime<Utc>,
    /// When the status was last updated
    pub updated_at: DateTime<Utc>,
}

impl JobStatusCache {
    /// Create a fresh queued status document.
    pub fn new(
        job_id: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            status: JobStatus::Queued,
            progress: 0,
            current_step: None,
            error_message: None,
            result: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Update status and bump the updated_at timestamp.
    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Update progress and the current step description.
    pub fn set_progress(&mut self, progress: u8, step: impl Into<String>) {
        self.progress = progress.min(100);
        self.current_step = Some(step.into());
        self.updated_at = Utc::now();
    }

    /// Mark job as completed with a result payload.
    pub fn complete(&mut self, result: serde_json::Value) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.current_step = Some("completed".into());
        self.result = Some(result);
        self.updated_at = Utc::now();
    }

    /// Mark job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Mark job as stale (worker stopped updating it).
    pub fn mark_stale(&mut self) {
        self.status = JobStatus::Stale;
        self.error_message =
            Some("Processing timed out. The worker may have crashed. Please try again.".into());
        self.updated_at = Utc::now();
    }

    /// Check if the job should be considered stale.
    ///
    /// A job is stale when it is not terminal and its last update is older
    /// than `stale_threshold_secs`.
    pub fn is_stale(&self, stale_threshold_secs: i64) -> bool {
        if self.is_terminal() {
            return false;
        }
        (Utc::now() - self.updated_at).num_seconds() > stale_threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_queued() {
        let cache = JobStatusCache::new("job-1", "proj-1", "user-1");
        assert_eq!(cache.status, JobStatus::Queued);
        assert_eq!(cache.progress, 0);
        assert!(!cache.is_terminal());
    }

    #[test]
    fn status_transitions() {
        let mut cache = JobStatusCache::new("job-1", "proj-1", "user-1");

        cache.set_status(JobStatus::Processing);
        cache.set_progress(50, "video_generation");
        assert_eq!(cache.progress, 50);
        assert_eq!(cache.current_step.as_deref(), Some("video_generation"));

        cache.complete(serde_json::json!({"video_url": "https://cdn/x.mp4"}));
        assert_eq!(cache.status, JobStatus::Completed);
        assert_eq!(cache.progress, 100);
        assert!(cache.is_terminal());
    }

    #[test]
    fn stale_detection() {
        let mut cache = JobStatusCache::new("job-1", "proj-1", "user-1");
        cache.set_status(JobStatus::Processing);

        assert!(!cache.is_stale(60));

        cache.updated_at = Utc::now() - chrono::Duration::seconds(120);
        assert!(cache.is_stale(60));

        cache.complete(serde_json::Value::Null);
        assert!(!cache.is_stale(60));
    }
}
