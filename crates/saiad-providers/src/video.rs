//! Video generation client backed by the Runway task API.
//!
//! Generation is asynchronous: a create call returns a task id, and the
//! caller polls until the task reaches a terminal state. API failures map
//! to failed tasks rather than errors so a single bad segment does not
//! abort the enclosing stage.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use saiad_models::AspectRatio;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{VideoGenerator, VideoTask, VideoTaskStatus};

const DEFAULT_BASE_URL: &str = "https://api.runwayml.com";
const MODEL: &str = "gen4";
const API_VERSION: &str = "2024-11-06";

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Vec<String>,
    failure: Option<String>,
}

fn map_status(status: &str) -> VideoTaskStatus {
    match status {
        "RUNNING" => VideoTaskStatus::Processing,
        "SUCCEEDED" => VideoTaskStatus::Completed,
        "FAILED" => VideoTaskStatus::Failed,
        _ => VideoTaskStatus::Pending,
    }
}

/// Runway video generation client.
pub struct RunwayVideoClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl RunwayVideoClient {
    /// Create a new client reading `RUNWAY_API_KEY` from the environment.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("RUNWAY_API_KEY")
            .map_err(|_| ProviderError::config("RUNWAY_API_KEY not set"))?;
        Ok(Self::new(api_key, DEFAULT_BASE_URL))
    }

    /// Create a client with an explicit key and base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl VideoGenerator for RunwayVideoClient {
    async fn generate(
        &self,
        prompt: &str,
        duration_seconds: u32,
        aspect_ratio: AspectRatio,
    ) -> ProviderResult<VideoTask> {
        debug!("Submitting video generation: {} ({}s)", prompt, duration_seconds);

        let response = self
            .http
            .post(format!("{}/v1/image_to_video", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", API_VERSION)
            .json(&json!({
                "promptText": prompt,
                "model": MODEL,
                "duration": duration_seconds,
                "ratio": aspect_ratio.as_str(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Video generation rejected ({}): {}", status, body);
            return Ok(VideoTask::failed("", format!("API error: {}", status)));
        }

        let body: CreateTaskResponse = response.json().await?;
        Ok(VideoTask {
            task_id: body.id,
            status: VideoTaskStatus::Pending,
            video_url: None,
            error: None,
        })
    }

    async fn poll(&self, task_id: &str) -> ProviderResult<VideoTask> {
        let response = self
            .http
            .get(format!("{}/v1/tasks/{}", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Ok(VideoTask::failed(
                task_id,
                format!("Status check failed: {}", status),
            ));
        }

        let body: TaskStatusResponse = response.json().await?;
        let status = map_status(&body.status);

        Ok(VideoTask {
            task_id: task_id.to_string(),
            status,
            video_url: if status == VideoTaskStatus::Completed {
                body.output.into_iter().next()
            } else {
                None
            },
            error: if status == VideoTaskStatus::Failed {
                Some(body.failure.unwrap_or_else(|| "Unknown error".to_string()))
            } else {
                None
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_returns_pending_task() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/image_to_video"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "task-9"})),
            )
            .mount(&server)
            .await;

        let client = RunwayVideoClient::new("key", server.uri());
        let task = client
            .generate("product closeup", 10, AspectRatio::Landscape)
            .await
            .unwrap();

        assert_eq!(task.task_id, "task-9");
        assert_eq!(task.status, VideoTaskStatus::Pending);
    }

    #[tokio::test]
    async fn api_rejection_becomes_failed_task() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/image_to_video"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad prompt"))
            .mount(&server)
            .await;

        let client = RunwayVideoClient::new("key", server.uri());
        let task = client
            .generate("x", 5, AspectRatio::Portrait)
            .await
            .unwrap();

        assert_eq!(task.status, VideoTaskStatus::Failed);
        assert!(task.error.unwrap().contains("400"));
    }

    #[tokio::test]
    async fn poll_maps_succeeded_with_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/tasks/task-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "SUCCEEDED",
                "output": ["https://cdn/video.mp4"],
            })))
            .mount(&server)
            .await;

        let client = RunwayVideoClient::new("key", server.uri());
        let task = client.poll("task-9").await.unwrap();

        assert_eq!(task.status, VideoTaskStatus::Completed);
        assert_eq!(task.video_url.as_deref(), Some("https://cdn/video.mp4"));
    }

    #[tokio::test]
    async fn wait_until_done_times_out_as_failed_task() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/tasks/task-9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "RUNNING"})),
            )
            .mount(&server)
            .await;

        let client = RunwayVideoClient::new("key", server.uri());
        let task = client
            .wait_until_done(
                "task-9",
                Duration::from_millis(10),
                Duration::from_millis(50),
            )
            .await
            .unwrap();

        assert_eq!(task.status, VideoTaskStatus::Failed);
        assert!(task.error.unwrap().to_lowercase().contains("timeout"));
    }
}
