//! Background sweeper for stale jobs.
//!
//! The pipeline has no internal heartbeat beyond stage transitions, so a
//! crashed worker leaves its job stuck in "processing". This sweeper scans
//! the active set periodically and forces jobs without a recent status
//! update into the stale state so callers stop waiting on them.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use saiad_models::{JobId, PipelineStage, StageProgress};
use saiad_queue::{JobStatusStore, ProgressChannel, STALE_THRESHOLD_SECS};

/// Interval between sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Stale job sweeper service.
pub struct StaleJobSweeper {
    status: Arc<JobStatusStore>,
    progress: Arc<ProgressChannel>,
    enabled: bool,
}

impl StaleJobSweeper {
    /// Create a new sweeper.
    pub fn new(status: Arc<JobStatusStore>, progress: Arc<ProgressChannel>) -> Self {
        let enabled = std::env::var("ENABLE_STALE_DETECTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            status,
            progress,
            enabled,
        }
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely; spawn as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Stale job detection is disabled");
            return;
        }

        info!("Starting stale job sweeper (interval: {:?})", SWEEP_INTERVAL);

        let mut ticker = interval(SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep().await {
                error!("Stale job sweep error: {}", e);
            }
        }
    }

    /// Run a single sweep cycle. Returns (stale, recovered) counts.
    pub async fn sweep(&self) -> anyhow::Result<(u32, u32)> {
        let active_ids = self.status.active_jobs().await?;

        if active_ids.is_empty() {
            return Ok((0, 0));
        }

        let mut stale_count = 0u32;
        let mut recovered_count = 0u32;

        for job_id in active_ids {
            let Some(doc) = self.status.get(&job_id).await? else {
                // Document expired but the set entry lingered
                self.status.remove_active(&job_id).await.ok();
                continue;
            };

            if doc.is_terminal() {
                // Shouldn't be in the active set anymore
                self.status.remove_active(&job_id).await.ok();
                continue;
            }

            if !doc.is_stale(STALE_THRESHOLD_SECS) {
                continue;
            }

            stale_count += 1;
            warn!(
                job_id = %doc.job_id,
                project_id = %doc.project_id,
                updated_at = %doc.updated_at,
                "Detected stale job (no status update)"
            );

            if let Err(e) = self.recover(doc).await {
                error!(job_id = %job_id, "Failed to recover stale job: {}", e);
            } else {
                recovered_count += 1;
            }
        }

        if stale_count > 0 {
            info!(
                "Stale job sweep complete: {} stale, {} recovered",
                stale_count, recovered_count
            );
        }

        Ok((stale_count, recovered_count))
    }

    /// Force a stale job into the stale terminal state and notify clients.
    async fn recover(&self, mut doc: saiad_models::JobStatusCache) -> anyhow::Result<()> {
        doc.mark_stale();
        self.status.put(&doc).await?;

        let job_id = JobId::from_string(&doc.job_id);
        let message = doc
            .error_message
            .clone()
            .unwrap_or_else(|| "Processing timed out".to_string());
        self.progress
            .progress(&job_id, StageProgress::new(PipelineStage::Failed, 100, message))
            .await
            .ok();

        Ok(())
    }
}
