//! Pipeline orchestrator: drives the stage state machine for one run.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info};
use uuid::Uuid;

use saiad_models::{
    GenerationConfig, PipelineResult, PipelineStage, ProductInfo, Script, TemplateInfo,
};
use saiad_providers::{MusicSelector, ScriptGenerator, SpeechSynthesizer, VideoGenerator};

use crate::error::StageResult;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::segments::parse_segments;
use crate::stages::{
    run_audio_stage, run_composite_stage, run_export_stage, run_music_stage, run_script_stage,
    run_video_stage,
};

/// The provider clients owned by one pipeline run.
///
/// Clients are never shared across concurrent runs; each run acquires its
/// own set at construction and releases it exactly once at completion.
pub struct ProviderSet {
    pub script: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub music: Arc<dyn MusicSelector>,
    pub video: Arc<dyn VideoGenerator>,
}

impl ProviderSet {
    async fn close_all(&self) {
        tokio::join!(
            self.script.close(),
            self.speech.close(),
            self.music.close(),
            self.video.close(),
        );
    }
}

/// Timing knobs for a run. Tests override these to avoid real waits.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Delay between audio synthesis calls (provider rate-limit courtesy)
    pub audio_rate_delay: Duration,
    /// Poll interval while waiting on video generation tasks
    pub video_poll_interval: Duration,
    /// Ceiling on waiting for a single video generation task
    pub video_max_wait: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            audio_rate_delay: Duration::from_millis(500),
            video_poll_interval: Duration::from_secs(5),
            video_max_wait: Duration::from_secs(300),
        }
    }
}

/// One video generation pipeline run.
///
/// Single-use: construction mints a fresh pipeline id, [`run`] consumes the
/// pipeline and always yields a well-formed [`PipelineResult`], whatever
/// happens inside the stages. Provider clients are released exactly once on
/// every path, including panics.
///
/// [`run`]: VideoPipeline::run
pub struct VideoPipeline {
    pipeline_id: String,
    project_id: String,
    providers: ProviderSet,
    options: PipelineOptions,
    tracker: ProgressTracker,
}

impl VideoPipeline {
    pub fn new(
        project_id: impl Into<String>,
        providers: ProviderSet,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        let pipeline_id = Uuid::new_v4().to_string();
        let tracker = ProgressTracker::new(pipeline_id.clone(), observer);
        Self {
            pipeline_id,
            project_id: project_id.into(),
            providers,
            options: PipelineOptions::default(),
            tracker,
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    /// Execute the full pipeline.
    ///
    /// This is the top-level recovery boundary: stage errors and panics
    /// both convert into a failure result, and the provider set is closed
    /// before returning on every path.
    pub async fn run(
        self,
        product: &ProductInfo,
        template: &TemplateInfo,
        config: &GenerationConfig,
        existing_script: Option<Script>,
    ) -> PipelineResult {
        info!(
            pipeline_id = %self.pipeline_id,
            project_id = %self.project_id,
            "Pipeline run starting"
        );
        self.tracker
            .update(PipelineStage::Initialized, 100, "Pipeline initialized");

        let outcome = AssertUnwindSafe(self.run_inner(product, template, config, existing_script))
            .catch_unwind()
            .await;

        self.providers.close_all().await;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => self.failure(e.to_string()),
            Err(panic) => self.failure(panic_message(panic)),
        }
    }

    async fn run_inner(
        &self,
        product: &ProductInfo,
        template: &TemplateInfo,
        config: &GenerationConfig,
        existing_script: Option<Script>,
    ) -> StageResult<PipelineResult> {
        let script = run_script_stage(
            self.providers.script.as_ref(),
            &self.tracker,
            product,
            template,
            config,
            existing_script,
        )
        .await?;

        let mut segments = parse_segments(&script, config.duration_seconds);

        // Fork-join: audio mutates the segments, music never touches them.
        let (audio_outcomes, music_track) = tokio::join!(
            run_audio_stage(
                self.providers.speech.as_ref(),
                &self.tracker,
                &mut segments,
                &config.voice_preset,
                self.options.audio_rate_delay,
            ),
            run_music_stage(
                self.providers.music.as_ref(),
                &self.tracker,
                &product.category,
                config.duration_seconds,
            ),
        );

        let video_outcomes = run_video_stage(
            self.providers.video.as_ref(),
            &self.tracker,
            &mut segments,
            config.aspect_ratio,
            self.options.video_poll_interval,
            self.options.video_max_wait,
        )
        .await;

        let composite = run_composite_stage(
            &self.tracker,
            &self.pipeline_id,
            &video_outcomes,
            &audio_outcomes,
            &music_track,
        )
        .await?;

        let export = run_export_stage(
            &self.tracker,
            &self.pipeline_id,
            Some(&composite),
            config.export_format,
        )
        .await;

        self.tracker
            .update(PipelineStage::Completed, 100, "Pipeline completed");

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "script".to_string(),
            serde_json::to_value(&script).unwrap_or(serde_json::Value::Null),
        );
        metadata.insert("segments".to_string(), segments.len().into());
        metadata.insert("format".to_string(), config.export_format.as_str().into());

        Ok(PipelineResult {
            success: true,
            pipeline_id: self.pipeline_id.clone(),
            project_id: self.project_id.clone(),
            video_url: export.as_ref().map(|e| e.video_url.clone()),
            thumbnail_url: export.as_ref().map(|e| e.thumbnail_url.clone()),
            duration: Some(config.duration_seconds as f64),
            stages: self.tracker.history(),
            error: None,
            metadata,
        })
    }

    fn failure(&self, message: String) -> PipelineResult {
        error!(
            pipeline_id = %self.pipeline_id,
            "Pipeline run failed: {}",
            message
        );
        self.tracker
            .update(PipelineStage::Failed, 100, message.clone());
        PipelineResult::failure(
            self.pipeline_id.clone(),
            self.project_id.clone(),
            self.tracker.history(),
            message,
        )
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unexpected internal error".to_string()
    }
}
