//! Audio stage: per-segment narration synthesis.

use std::time::Duration;

use tracing::warn;

use saiad_models::{PipelineStage, Segment, SegmentOutcome};
use saiad_providers::SpeechSynthesizer;

use crate::progress::ProgressTracker;

/// Synthesize narration for every segment, in index order.
///
/// Segments without narration are recorded as trivially successful with no
/// audio. A failed synthesis is recorded and iteration continues; the stage
/// never aborts. A fixed delay runs between provider calls to stay under
/// the vendor's rate limit. Progress scales with segments processed up to
/// 90% and is forced to 100% at the end regardless of partial failures.
pub async fn run_audio_stage(
    synthesizer: &dyn SpeechSynthesizer,
    tracker: &ProgressTracker,
    segments: &mut [Segment],
    voice_preset: &str,
    rate_delay: Duration,
) -> Vec<SegmentOutcome> {
    let total = segments.len();
    tracker.update(PipelineStage::AudioGeneration, 0, "Generating narration audio");

    let voice = synthesizer.preset_voice(voice_preset);
    let mut outcomes = Vec::with_capacity(total);

    for segment in segments.iter_mut() {
        if !segment.has_narration() {
            outcomes.push(SegmentOutcome::ok(segment.index, None));
            report(tracker, outcomes.len(), total, "skipped, no narration");
            continue;
        }

        let narration = segment.narration.as_deref().unwrap_or_default();
        match synthesizer.synthesize(narration, &voice.voice_id).await {
            Ok(audio) => {
                segment.audio_data = Some(audio.audio_data);
                outcomes.push(SegmentOutcome::ok(segment.index, None));
                report(tracker, outcomes.len(), total, "narration synthesized");
            }
            Err(e) => {
                warn!(segment = segment.index, "Audio synthesis failed: {}", e);
                outcomes.push(SegmentOutcome::failed(segment.index, e.to_string()));
                report(tracker, outcomes.len(), total, "synthesis failed");
            }
        }

        tokio::time::sleep(rate_delay).await;
    }

    tracker.update(PipelineStage::AudioGeneration, 100, "Audio generation complete");
    outcomes
}

fn report(tracker: &ProgressTracker, processed: usize, total: usize, detail: &str) {
    let progress = ((processed as f64 / total.max(1) as f64) * 90.0) as u8;
    tracker.update(
        PipelineStage::AudioGeneration,
        progress,
        format!("Segment {}/{}: {}", processed, total, detail),
    );
}
