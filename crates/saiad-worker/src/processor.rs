//! Generation job processing.
//!
//! Wires a queue job into a pipeline run: builds the run's provider set,
//! bridges pipeline progress into the durable status store and the live
//! progress channel, and enforces the per-job wall-clock ceiling.

use std::sync::{Arc, Mutex};

use tracing::warn;

use saiad_models::{JobId, JobStatus, JobStatusCache, PipelineStage, StageProgress};
use saiad_pipeline::{ProgressObserver, ProviderSet, VideoPipeline};
use saiad_providers::{
    AnthropicScriptClient, ElevenLabsSpeechClient, MusicSelector, RunwayVideoClient,
    StockMusicLibrary, SunoMusicClient,
};
use saiad_queue::{GenerateVideoJob, JobStatusStore, ProgressChannel};

use crate::config::WorkerConfig;
use crate::error::{is_transient_message, WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Shared context for job processing.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub status: Arc<JobStatusStore>,
    pub progress: Arc<ProgressChannel>,
}

impl ProcessingContext {
    /// Create a new processing context.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let status = Arc::new(JobStatusStore::new(&redis_url)?);
        let progress = Arc::new(ProgressChannel::new(&redis_url)?);

        Ok(Self {
            config,
            status,
            progress,
        })
    }
}

/// Map a stage-local percentage onto the job's overall 0-100 scale.
///
/// Audio and music share a band since they run concurrently; the status
/// observer keeps the overall value monotonic.
fn overall_progress(stage: PipelineStage, stage_pct: u8) -> u8 {
    let (base, span) = match stage {
        PipelineStage::Initialized => (0u32, 5u32),
        PipelineStage::ScriptGeneration => (5, 10),
        PipelineStage::AudioGeneration | PipelineStage::MusicGeneration => (15, 15),
        PipelineStage::VideoGeneration => (30, 40),
        PipelineStage::VideoCompositing => (70, 15),
        PipelineStage::FinalExport => (85, 10),
        PipelineStage::Completed | PipelineStage::Failed => (100, 0),
    };
    (base + span * stage_pct.min(100) as u32 / 100).min(100) as u8
}

/// Progress observer that writes through to the status store and publishes
/// live events.
///
/// `on_progress` is synchronous, so the Redis writes are spawned
/// fire-and-forget; a slow or failing sink never stalls the pipeline.
struct StatusSinkObserver {
    job_id: JobId,
    status: Arc<JobStatusStore>,
    progress: Arc<ProgressChannel>,
    doc: Mutex<JobStatusCache>,
}

impl StatusSinkObserver {
    fn new(
        job: &GenerateVideoJob,
        status: Arc<JobStatusStore>,
        progress: Arc<ProgressChannel>,
    ) -> Self {
        let mut doc = JobStatusCache::new(job.job_id.as_str(), &job.project_id, &job.user_id);
        doc.set_status(JobStatus::Processing);
        Self {
            job_id: job.job_id.clone(),
            status,
            progress,
            doc: Mutex::new(doc),
        }
    }

    fn snapshot(&self) -> JobStatusCache {
        self.doc.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ProgressObserver for StatusSinkObserver {
    fn on_progress(&self, progress: &StageProgress) {
        let snapshot = {
            let mut doc = self.doc.lock().unwrap_or_else(|e| e.into_inner());
            let overall = overall_progress(progress.stage, progress.progress);
            if overall >= doc.progress {
                doc.set_progress(overall, progress.stage.as_str());
            }
            doc.clone()
        };

        let status = Arc::clone(&self.status);
        let channel = Arc::clone(&self.progress);
        let job_id = self.job_id.clone();
        let event = progress.clone();
        tokio::spawn(async move {
            if let Err(e) = status.put(&snapshot).await {
                warn!(job_id = %job_id, "Failed to write job status: {}", e);
            }
            if let Err(e) = channel.progress(&job_id, event).await {
                warn!(job_id = %job_id, "Failed to publish progress event: {}", e);
            }
        });
    }
}

/// Build the provider set owned by one pipeline run.
fn build_provider_set(job: &GenerateVideoJob) -> WorkerResult<ProviderSet> {
    let music: Arc<dyn MusicSelector> = if job.config.use_generative_music {
        Arc::new(SunoMusicClient::from_env()?)
    } else {
        Arc::new(StockMusicLibrary::new())
    };

    Ok(ProviderSet {
        script: Arc::new(AnthropicScriptClient::from_env()?),
        speech: Arc::new(ElevenLabsSpeechClient::from_env()?),
        music,
        video: Arc::new(RunwayVideoClient::from_env()?),
    })
}

/// Process a video generation job end to end.
///
/// Writes the terminal status document on every path. A hard pipeline
/// failure with a transient error message returns an error so the
/// executor's retry policy can redeliver the job; other failures are
/// terminal.
pub async fn process_generate_video(
    ctx: &ProcessingContext,
    job: &GenerateVideoJob,
) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "generate_video");
    logger.log_start(&format!(
        "Generating video for project {} ({})",
        job.project_id, job.product.name
    ));

    let providers = build_provider_set(job)?;
    let observer = Arc::new(StatusSinkObserver::new(
        job,
        Arc::clone(&ctx.status),
        Arc::clone(&ctx.progress),
    ));
    ctx.status.put(&observer.snapshot()).await?;

    let pipeline = VideoPipeline::new(&job.project_id, providers, observer.clone());

    let result = match tokio::time::timeout(
        ctx.config.job_timeout,
        pipeline.run(
            &job.product,
            &job.template,
            &job.config,
            job.existing_script.clone(),
        ),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            let message = format!(
                "Job exceeded the {}s processing ceiling",
                ctx.config.job_timeout.as_secs()
            );
            logger.log_error(&message);
            let mut doc = observer.snapshot();
            doc.fail(&message);
            ctx.status.put(&doc).await?;
            return Err(WorkerError::timeout(message));
        }
    };

    if result.success {
        logger.log_completion(&format!(
            "Video ready: {}",
            result.video_url.as_deref().unwrap_or("(no url)")
        ));
        let mut doc = observer.snapshot();
        doc.complete(serde_json::to_value(&result)?);
        ctx.status.put(&doc).await?;
        return Ok(());
    }

    let error = result
        .error
        .clone()
        .unwrap_or_else(|| "Unknown pipeline failure".to_string());
    logger.log_error(&error);

    let mut doc = observer.snapshot();
    doc.fail(&error);
    doc.result = serde_json::to_value(&result).ok();
    ctx.status.put(&doc).await?;

    if is_transient_message(&error) {
        // Redelivery gets a fresh run; the status doc is rewritten then.
        return Err(WorkerError::job_failed(error));
    }

    // Hard failure: the status document is the answer, retrying won't help.
    Ok(())
}
