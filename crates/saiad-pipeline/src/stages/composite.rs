//! Compositing stage: decide which assets are eligible and name the artifact.

use tracing::info;

use saiad_models::{successful_urls, PipelineStage, SegmentOutcome};
use saiad_providers::MusicTrack;

use crate::error::{PipelineError, StageResult};
use crate::progress::ProgressTracker;

/// Reference to the composited (pre-export) video artifact.
#[derive(Debug, Clone)]
pub struct CompositeArtifact {
    pub url: String,
    /// How many segment videos went into the composite
    pub source_count: usize,
}

/// Run the compositing stage.
///
/// Filters the video outcomes down to segments whose generation succeeded
/// and claims the composite artifact's identity. Zero usable videos is a
/// hard pipeline failure. Actual muxing is the media-encoding service's
/// job; this stage only decides what is eligible and under which URL the
/// composite lives.
pub async fn run_composite_stage(
    tracker: &ProgressTracker,
    pipeline_id: &str,
    video_outcomes: &[SegmentOutcome],
    audio_outcomes: &[SegmentOutcome],
    music: &MusicTrack,
) -> StageResult<CompositeArtifact> {
    tracker.update(PipelineStage::VideoCompositing, 0, "Compositing video segments");

    let urls = successful_urls(video_outcomes);
    if urls.is_empty() {
        return Err(PipelineError::NoComposableVideo);
    }

    let audio_count = audio_outcomes.iter().filter(|o| o.success).count();
    info!(
        videos = urls.len(),
        audio_tracks = audio_count,
        music = %music.url,
        "Composite asset set selected"
    );

    tracker.update(
        PipelineStage::VideoCompositing,
        50,
        format!("Merging {} video segments", urls.len()),
    );
    tracker.update(PipelineStage::VideoCompositing, 80, "Mixing audio and music");

    let artifact = CompositeArtifact {
        url: format!("https://cdn.saiad.io/videos/{}/composite.mp4", pipeline_id),
        source_count: urls.len(),
    };

    tracker.update(PipelineStage::VideoCompositing, 100, "Composite ready");
    Ok(artifact)
}
