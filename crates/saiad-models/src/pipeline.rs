//! Pipeline stage, progress, and result types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the video generation pipeline.
///
/// Strictly ordered except `AudioGeneration` and `MusicGeneration`, which
/// run concurrently between script and video generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initialized,
    ScriptGeneration,
    AudioGeneration,
    MusicGeneration,
    VideoGeneration,
    VideoCompositing,
    FinalExport,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Initialized => "initialized",
            PipelineStage::ScriptGeneration => "script_generation",
            PipelineStage::AudioGeneration => "audio_generation",
            PipelineStage::MusicGeneration => "music_generation",
            PipelineStage::VideoGeneration => "video_generation",
            PipelineStage::VideoCompositing => "video_compositing",
            PipelineStage::FinalExport => "final_export",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }

    /// Check if this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress record for one pipeline stage.
///
/// At most one record exists per stage per run; it is updated in place
/// (identified by stage equality) as the stage advances.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StageProgress {
    /// Which stage this record tracks
    pub stage: PipelineStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable status message
    pub message: String,
    /// When the stage was first observed
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage reached 100%
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageProgress {
    /// Create a new stage progress record, stamped as started now.
    pub fn new(stage: PipelineStage, progress: u8, message: impl Into<String>) -> Self {
        let now = Utc::now();
        let progress = progress.min(100);
        Self {
            stage,
            progress,
            message: message.into(),
            started_at: Some(now),
            completed_at: if progress == 100 { Some(now) } else { None },
        }
    }

    /// Update progress in place. Progress never moves backwards;
    /// `completed_at` is stamped exactly when 100 is reached.
    pub fn update(&mut self, progress: u8, message: impl Into<String>) {
        let progress = progress.min(100);
        if progress > self.progress {
            self.progress = progress;
        }
        self.message = message.into();
        if self.progress == 100 && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }

    /// Check if the stage has finished.
    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }
}

/// Final result of a pipeline run.
///
/// Built exactly once at the end of a run (success or failure) and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineResult {
    /// Whether the full pipeline completed
    pub success: bool,
    /// Unique pipeline run identifier
    pub pipeline_id: String,
    /// Project this run belongs to
    pub project_id: String,
    /// Final exported video URL
    pub video_url: Option<String>,
    /// Thumbnail URL
    pub thumbnail_url: Option<String>,
    /// Final video duration in seconds
    pub duration: Option<f64>,
    /// Full per-stage history of the run
    pub stages: Vec<StageProgress>,
    /// Error message for failed runs
    pub error: Option<String>,
    /// Free-form run metadata (script reference, segment count, format)
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl PipelineResult {
    /// Build a failure result carrying the stage history so far.
    pub fn failure(
        pipeline_id: impl Into<String>,
        project_id: impl Into<String>,
        stages: Vec<StageProgress>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            pipeline_id: pipeline_id.into(),
            project_id: project_id.into(),
            video_url: None,
            thumbnail_url: None,
            duration: None,
            stages,
            error: Some(error.into()),
            metadata: serde_json::Map::new(),
        }
    }
}

/// Outcome of processing a single segment in the audio or video stage.
///
/// Partial failures are recorded here instead of aborting the stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SegmentOutcome {
    /// Segment index this outcome belongs to
    pub index: usize,
    /// Whether the provider call succeeded (or was trivially skipped)
    pub success: bool,
    /// Generated asset URL, if any
    pub asset_url: Option<String>,
    /// Error message for failed segments
    pub error: Option<String>,
}

impl SegmentOutcome {
    pub fn ok(index: usize, asset_url: Option<String>) -> Self {
        Self {
            index,
            success: true,
            asset_url,
            error: None,
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            asset_url: None,
            error: Some(error.into()),
        }
    }
}

/// Mutate-or-insert a stage progress record in a run's history.
///
/// Returns a clone of the record after the update, suitable for
/// broadcasting to observers.
pub fn upsert_stage_progress(
    stages: &mut Vec<StageProgress>,
    stage: PipelineStage,
    progress: u8,
    message: impl Into<String>,
) -> StageProgress {
    let message = message.into();
    if let Some(existing) = stages.iter_mut().find(|s| s.stage == stage) {
        existing.update(progress, message);
        existing.clone()
    } else {
        let record = StageProgress::new(stage, progress, message);
        stages.push(record.clone());
        record
    }
}

/// Helpers shared by the audio/video stage executors and their tests.
pub fn successful_urls(outcomes: &[SegmentOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter(|o| o.success)
        .filter_map(|o| o.asset_url.clone())
        .collect()
}
