//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use saiad_models::{GenerationConfig, JobId, ProductInfo, Script, TemplateInfo};

/// Job to generate an ad video for a project.
///
/// Carries everything the pipeline needs so the worker never has to look
/// up request context elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Project the video belongs to
    pub project_id: String,
    /// User ID
    pub user_id: String,
    /// Product descriptor
    pub product: ProductInfo,
    /// Template descriptor
    pub template: TemplateInfo,
    /// Generation configuration
    pub config: GenerationConfig,
    /// Pre-supplied script; skips script generation when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_script: Option<Script>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl GenerateVideoJob {
    /// Create a new generation job with the default config.
    pub fn new(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        product: ProductInfo,
        template: TemplateInfo,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            product,
            template,
            config: GenerationConfig::default(),
            existing_script: None,
            created_at: Utc::now(),
        }
    }

    /// Set the generation config.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply an existing script, skipping generation.
    pub fn with_script(mut self, script: Script) -> Self {
        self.existing_script = Some(script);
        self
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("generate:{}:{}", self.user_id, self.project_id)
    }
}

/// Generic job wrapper for queue storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    /// Full video generation pipeline run
    GenerateVideo(GenerateVideoJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::GenerateVideo(j) => &j.job_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            QueueJob::GenerateVideo(j) => &j.user_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::GenerateVideo(j) => j.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> GenerateVideoJob {
        GenerateVideoJob::new(
            "user-1",
            "proj-1",
            ProductInfo {
                name: "Nova X".to_string(),
                category: "smartphone".to_string(),
                features: vec![],
                specs: serde_json::Map::new(),
            },
            TemplateInfo {
                id: "tpl-1".to_string(),
                style: "unboxing".to_string(),
            },
        )
    }

    #[test]
    fn queue_job_round_trips_through_json() {
        let job = sample_job();
        let wrapper = QueueJob::GenerateVideo(job.clone());
        let json = serde_json::to_string(&wrapper).expect("serialize QueueJob");
        assert!(json.contains("\"type\":\"generate_video\""));

        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");
        let QueueJob::GenerateVideo(j) = decoded;
        assert_eq!(j.job_id, job.job_id);
        assert_eq!(j.project_id, job.project_id);
        assert_eq!(j.created_at, job.created_at);
        assert!(j.existing_script.is_none());
    }

    #[test]
    fn idempotency_key_is_stable_per_user_and_project() {
        let a = sample_job();
        let b = sample_job();
        // Different job ids, same dedup identity
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert_eq!(a.idempotency_key(), "generate:user-1:proj-1");
    }
}
