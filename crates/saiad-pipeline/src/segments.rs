//! Script-to-segment conversion.

use saiad_models::{Scene, Script, Segment};

/// Convert a parsed script into an ordered list of video segments.
///
/// The total duration is partitioned among scenes: a scene with an
/// explicit duration keeps it, otherwise it receives an equal share of
/// the total. Segments are laid out back to back starting at 0, so the
/// timeline is gapless regardless of how the per-scene durations came
/// about. The script stage rejects sceneless scripts before this runs.
pub fn parse_segments(script: &Script, total_duration_seconds: u32) -> Vec<Segment> {
    if script.scenes.is_empty() {
        return Vec::new();
    }

    let base = total_duration_seconds as f64 / script.scenes.len() as f64;
    let mut segments = Vec::with_capacity(script.scenes.len());
    let mut cursor = 0.0;

    for (index, scene) in script.scenes.iter().enumerate() {
        let duration = scene_duration(scene, base);
        segments.push(Segment::new(
            index,
            cursor,
            cursor + duration,
            scene.visual_description.clone(),
            non_empty(&scene.narration),
        ));
        cursor += duration;
    }

    segments
}

fn scene_duration(scene: &Scene, base: f64) -> f64 {
    match scene.duration {
        Some(d) if d > 0.0 => d,
        _ => base,
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
