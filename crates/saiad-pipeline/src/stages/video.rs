//! Video stage: per-segment clip generation via the provider's task API.

use std::time::Duration;

use tracing::warn;

use saiad_models::{AspectRatio, PipelineStage, Segment, SegmentOutcome};
use saiad_providers::{VideoGenerator, VideoTaskStatus};

use crate::progress::ProgressTracker;

/// Generate a video clip for every segment, sequentially in index order.
///
/// Sequential on purpose: the provider's rate limits and per-clip cost make
/// concurrent submission risky. A failed or timed-out generation is
/// recorded per segment and the loop continues. Progress is linear in
/// segments processed, capped at 90% until the loop completes.
pub async fn run_video_stage(
    generator: &dyn VideoGenerator,
    tracker: &ProgressTracker,
    segments: &mut [Segment],
    aspect_ratio: AspectRatio,
    poll_interval: Duration,
    max_wait: Duration,
) -> Vec<SegmentOutcome> {
    let total = segments.len();
    tracker.update(PipelineStage::VideoGeneration, 0, "Generating video segments");

    let mut outcomes = Vec::with_capacity(total);

    for segment in segments.iter_mut() {
        let outcome = generate_segment(generator, segment, aspect_ratio, poll_interval, max_wait)
            .await;
        if let Some(error) = &outcome.error {
            warn!(segment = segment.index, "Video generation failed: {}", error);
        }
        outcomes.push(outcome);

        let progress = ((outcomes.len() as f64 / total.max(1) as f64) * 90.0) as u8;
        tracker.update(
            PipelineStage::VideoGeneration,
            progress,
            format!("Segment {}/{} processed", outcomes.len(), total),
        );
    }

    tracker.update(PipelineStage::VideoGeneration, 100, "Video generation complete");
    outcomes
}

async fn generate_segment(
    generator: &dyn VideoGenerator,
    segment: &mut Segment,
    aspect_ratio: AspectRatio,
    poll_interval: Duration,
    max_wait: Duration,
) -> SegmentOutcome {
    let task = match generator
        .generate(&segment.visual_prompt, segment.duration_rounded(), aspect_ratio)
        .await
    {
        Ok(task) => task,
        Err(e) => return SegmentOutcome::failed(segment.index, e.to_string()),
    };

    if task.status == VideoTaskStatus::Failed {
        return SegmentOutcome::failed(
            segment.index,
            task.error.unwrap_or_else(|| "Video generation failed".to_string()),
        );
    }

    let done = match generator
        .wait_until_done(&task.task_id, poll_interval, max_wait)
        .await
    {
        Ok(done) => done,
        Err(e) => return SegmentOutcome::failed(segment.index, e.to_string()),
    };

    match (done.status, done.video_url) {
        (VideoTaskStatus::Completed, Some(url)) => {
            segment.video_url = Some(url.clone());
            SegmentOutcome::ok(segment.index, Some(url))
        }
        (VideoTaskStatus::Completed, None) => {
            SegmentOutcome::failed(segment.index, "Completed task returned no video URL")
        }
        (_, _) => SegmentOutcome::failed(
            segment.index,
            done.error
                .unwrap_or_else(|| "Video generation failed".to_string()),
        ),
    }
}
