//! Provider capability contracts.
//!
//! The orchestrator depends on these traits only; concrete vendor bindings
//! are configuration. All methods return failure values instead of
//! panicking, so the pipeline can treat "stage failed" uniformly.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use saiad_models::{AspectRatio, ProductInfo, Script};

use crate::error::ProviderResult;
use crate::speech::Voice;

/// Synthesized narration audio.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub audio_data: Vec<u8>,
}

/// Selected or generated background music track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MusicTrack {
    /// Stock track id, if this came from the stock library
    pub id: Option<String>,
    /// Track URL
    pub url: String,
    /// Track duration in seconds
    pub duration: f64,
}

/// Status of a remote video generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoTaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl VideoTaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoTaskStatus::Completed | VideoTaskStatus::Failed)
    }
}

/// Handle plus current state of a video generation task.
#[derive(Debug, Clone)]
pub struct VideoTask {
    pub task_id: String,
    pub status: VideoTaskStatus,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

impl VideoTask {
    /// A failed task carrying an error message (used for API failures and
    /// poll timeouts, which are per-segment failures rather than hard
    /// pipeline errors).
    pub fn failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: VideoTaskStatus::Failed,
            video_url: None,
            error: Some(error.into()),
        }
    }
}

/// Generates advertising scripts from product information.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(
        &self,
        product: &ProductInfo,
        template_style: &str,
        duration_seconds: u32,
        tone: &str,
        target_audience: Option<&str>,
    ) -> ProviderResult<Script>;

    /// Release the underlying client. Called exactly once per pipeline run.
    async fn close(&self) {}
}

/// Synthesizes narration audio from text.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> ProviderResult<SpeechAudio>;

    /// Resolve a voice preset key, falling back to the default preset for
    /// unknown keys.
    fn preset_voice(&self, preset_key: &str) -> Voice;

    /// Release the underlying client. Called exactly once per pipeline run.
    async fn close(&self) {}
}

/// Selects or generates background music.
#[async_trait]
pub trait MusicSelector: Send + Sync {
    async fn select_or_generate(
        &self,
        category: &str,
        duration_seconds: u32,
    ) -> ProviderResult<MusicTrack>;

    /// True for the stock library, which never performs a network call and
    /// cannot fail.
    fn is_stock(&self) -> bool {
        false
    }

    /// Release the underlying client. Called exactly once per pipeline run.
    async fn close(&self) {}
}

/// Generates video clips from text prompts via an asynchronous task API.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submit a generation request, returning a task handle for polling.
    async fn generate(
        &self,
        prompt: &str,
        duration_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> ProviderResult<VideoTask>;

    /// Check the current status of a generation task.
    async fn poll(&self, task_id: &str) -> ProviderResult<VideoTask>;

    /// Poll until the task reaches a terminal state or `max_wait` elapses.
    ///
    /// A timeout yields a Failed task (per-segment failure), not an `Err`.
    async fn wait_until_done(
        &self,
        task_id: &str,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> ProviderResult<VideoTask> {
        let mut elapsed = Duration::ZERO;
        while elapsed < max_wait {
            let task = self.poll(task_id).await?;
            if task.status.is_terminal() {
                return Ok(task);
            }
            tokio::time::sleep(poll_interval).await;
            elapsed += poll_interval;
        }

        Ok(VideoTask::failed(
            task_id,
            "Timeout waiting for video generation",
        ))
    }

    /// Release the underlying client. Called exactly once per pipeline run.
    async fn close(&self) {}
}
