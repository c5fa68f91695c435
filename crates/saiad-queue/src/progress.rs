//! Progress events via Redis Pub/Sub.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;

use saiad_models::{JobId, StageProgress};

use crate::error::QueueResult;

/// Progress event published to Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Job ID
    pub job_id: JobId,
    /// Stage progress snapshot
    pub progress: StageProgress,
}

/// Channel for publishing/subscribing to progress events.
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    /// Create a new progress channel.
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Get the channel name for a job.
    pub fn channel_name(job_id: &JobId) -> String {
        format!("progress:{}", job_id)
    }

    /// Publish a progress event.
    pub async fn publish(&self, event: &ProgressEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.job_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing progress event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish a stage progress update.
    pub async fn progress(&self, job_id: &JobId, progress: StageProgress) -> QueueResult<()> {
        self.publish(&ProgressEvent {
            job_id: job_id.clone(),
            progress,
        })
        .await
    }

    /// Subscribe to progress events for a job.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(
        &self,
        job_id: &JobId,
    ) -> QueueResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = ProgressEvent> + Send>>>
    {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(job_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saiad_models::PipelineStage;

    #[test]
    fn channel_name_is_keyed_by_job_id() {
        let job_id = JobId::from_string("job-42");
        assert_eq!(ProgressChannel::channel_name(&job_id), "progress:job-42");
    }

    #[test]
    fn progress_event_round_trips() {
        let event = ProgressEvent {
            job_id: JobId::new(),
            progress: StageProgress::new(PipelineStage::VideoGeneration, 60, "Segment 2/3"),
        };
        let json = serde_json::to_string(&event).expect("serialize event");
        let decoded: ProgressEvent = serde_json::from_str(&json).expect("deserialize event");
        assert_eq!(decoded.job_id, event.job_id);
        assert_eq!(decoded.progress.progress, 60);
        assert_eq!(decoded.progress.stage, PipelineStage::VideoGeneration);
    }
}
