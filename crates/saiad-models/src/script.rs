//! Ad script types produced by the script generation provider.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One scene of the generated ad script.
///
/// Missing fields degrade gracefully: narration defaults to empty and
/// duration falls back to an even split of the total ad length.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Scene ordering as returned by the script provider (1-based)
    #[serde(default)]
    pub order: u32,
    /// Visual description used as the video generation prompt
    #[serde(default)]
    pub visual_description: String,
    /// Narration for this scene
    #[serde(default)]
    pub narration: String,
    /// Explicit scene duration in seconds, if the script provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Generated advertising script.
///
/// The orchestrator treats this as mostly opaque; only `scenes` drives
/// pipeline behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// Main headline
    #[serde(default)]
    pub headline: String,
    /// Sub copy line
    #[serde(default)]
    pub subline: String,
    /// Full narration text
    #[serde(default)]
    pub narration: String,
    /// Call-to-action phrase
    #[serde(default)]
    pub cta: String,
    /// Ordered scene list
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Script {
    /// True if the script has no usable scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_scene_fields_default() {
        let json = r#"{"scenes": [{"order": 1}, {"visual_description": "product closeup"}]}"#;
        let script: Script = serde_json::from_str(json).unwrap();

        assert_eq!(script.scenes.len(), 2);
        assert_eq!(script.scenes[0].narration, "");
        assert!(script.scenes[0].duration.is_none());
        assert_eq!(script.scenes[1].visual_description, "product closeup");
        assert_eq!(script.headline, "");
    }

    #[test]
    fn empty_script_detection() {
        let script = Script::default();
        assert!(script.is_empty());
    }
}
