//! Video segment model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One scene/shot of the generated ad.
///
/// Segments are created once when the script is parsed and then mutated by
/// the audio stage (attaches audio) and video stage (attaches the generated
/// video URL). They are owned exclusively by a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Ordinal position within the ad
    pub index: usize,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds (always > start_time)
    pub end_time: f64,
    /// Visual prompt for video generation
    pub visual_prompt: String,
    /// Narration text, if the scene has any
    pub narration: Option<String>,
    /// Generated video URL (set by the video stage)
    pub video_url: Option<String>,
    /// Generated narration audio (set by the audio stage)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<Vec<u8>>,
}

impl Segment {
    pub fn new(
        index: usize,
        start_time: f64,
        end_time: f64,
        visual_prompt: impl Into<String>,
        narration: Option<String>,
    ) -> Self {
        Self {
            index,
            start_time,
            end_time,
            visual_prompt: visual_prompt.into(),
            narration,
            video_url: None,
            audio_data: None,
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Duration rounded to whole seconds, as provider APIs expect.
    pub fn duration_rounded(&self) -> u32 {
        self.duration().round().max(0.0) as u32
    }

    /// True if the segment has narration worth synthesizing.
    pub fn has_narration(&self) -> bool {
        self.narration
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_rounded_for_providers() {
        let seg = Segment::new(0, 0.0, 9.6, "prompt", None);
        assert_eq!(seg.duration_rounded(), 10);
    }

    #[test]
    fn whitespace_narration_does_not_count() {
        let seg = Segment::new(0, 0.0, 5.0, "prompt", Some("   ".into()));
        assert!(!seg.has_narration());

        let seg = Segment::new(0, 0.0, 5.0, "prompt", Some("hello".into()));
        assert!(seg.has_narration());

        let seg = Segment::new(0, 0.0, 5.0, "prompt", None);
        assert!(!seg.has_narration());
    }
}
