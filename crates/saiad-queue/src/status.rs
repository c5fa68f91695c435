//! Durable job status store (Redis with TTL).
//!
//! The worker writes status documents as a run progresses; the status API
//! polls them by job id. Documents expire after 24 hours so abandoned jobs
//! are eventually reclaimed. An auxiliary set tracks non-terminal jobs so
//! the stale sweeper can scan them without a keyspace scan.

use redis::AsyncCommands;
use tracing::debug;

use saiad_models::JobStatusCache;

use crate::error::QueueResult;

/// TTL for job status documents (24 hours).
pub const JOB_STATUS_TTL_SECS: u64 = 86_400;

/// A processing job with no status update for this long is stale (30 minutes).
pub const STALE_THRESHOLD_SECS: i64 = 1_800;

/// Redis-backed job status store.
pub struct JobStatusStore {
    client: redis::Client,
}

impl JobStatusStore {
    /// Create a new status store.
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> QueueResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    fn status_key(job_id: &str) -> String {
        format!("saiad:job:{}", job_id)
    }

    const ACTIVE_SET_KEY: &'static str = "saiad:jobs:active";

    /// Write a status document, refreshing its TTL.
    ///
    /// Terminal jobs are removed from the active set; non-terminal jobs are
    /// added so the stale sweeper can find them.
    pub async fn put(&self, status: &JobStatusCache) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(status)?;
        conn.set_ex::<_, _, ()>(Self::status_key(&status.job_id), payload, JOB_STATUS_TTL_SECS)
            .await?;

        if status.is_terminal() {
            conn.srem::<_, _, ()>(Self::ACTIVE_SET_KEY, &status.job_id)
                .await?;
        } else {
            conn.sadd::<_, _, ()>(Self::ACTIVE_SET_KEY, &status.job_id)
                .await?;
        }

        debug!(
            job_id = %status.job_id,
            status = %status.status,
            progress = status.progress,
            "Job status written"
        );
        Ok(())
    }

    /// Read a job's status document, if it still exists.
    pub async fn get(&self, job_id: &str) -> QueueResult<Option<JobStatusCache>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = conn.get(Self::status_key(job_id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// List job ids currently tracked as non-terminal.
    pub async fn active_jobs(&self) -> QueueResult<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn.smembers(Self::ACTIVE_SET_KEY).await?;
        Ok(ids)
    }

    /// Drop a job from the active set without touching its document.
    ///
    /// Used when the document has already expired but the set entry remains.
    pub async fn remove_active(&self, job_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.srem::<_, _, ()>(Self::ACTIVE_SET_KEY, job_id).await?;
        Ok(())
    }
}
