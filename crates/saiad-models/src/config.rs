//! Generation configuration, product/template descriptors, and export profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown value: {0}")]
pub struct ParseEnumError(String);

/// Target aspect ratio for generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// Landscape 16:9
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Portrait 9:16
    #[serde(rename = "9:16")]
    Portrait,
    /// Square 1:1
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

/// Export target platform.
///
/// Unrecognized format strings fall back to YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Youtube,
    Instagram,
    Tiktok,
}

/// Fixed encoding profile for one export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ExportProfile {
    pub resolution: &'static str,
    pub codec: &'static str,
    pub bitrate: &'static str,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Youtube => "youtube",
            ExportFormat::Instagram => "instagram",
            ExportFormat::Tiktok => "tiktok",
        }
    }

    /// Parse a format name, falling back to YouTube for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "instagram" => ExportFormat::Instagram,
            "tiktok" => ExportFormat::Tiktok,
            _ => ExportFormat::Youtube,
        }
    }

    /// Encoding profile for this target.
    pub fn profile(&self) -> ExportProfile {
        match self {
            ExportFormat::Youtube => ExportProfile {
                resolution: "1080p",
                codec: "h264",
                bitrate: "8M",
            },
            ExportFormat::Instagram => ExportProfile {
                resolution: "1080p",
                codec: "h264",
                bitrate: "6M",
            },
            ExportFormat::Tiktok => ExportProfile {
                resolution: "1080p",
                codec: "h264",
                bitrate: "6M",
            },
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product descriptor fed into script and music generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductInfo {
    /// Product display name
    pub name: String,
    /// Product category (smartphone, tv, appliance, wearable, tablet, ...)
    #[serde(default)]
    pub category: String,
    /// Key feature bullet points
    #[serde(default)]
    pub features: Vec<String>,
    /// Free-form spec key/values
    #[serde(default)]
    pub specs: serde_json::Map<String, serde_json::Value>,
}

/// Template descriptor selecting the ad's overall style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TemplateInfo {
    /// Template identifier
    #[serde(default)]
    pub id: String,
    /// Template style keyword (unboxing, lifestyle, ...)
    #[serde(default)]
    pub style: String,
}

fn default_duration() -> u32 {
    30
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_voice_preset() -> String {
    "ko_professional_female".to_string()
}

/// Per-run generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationConfig {
    /// Total ad duration in seconds
    #[serde(default = "default_duration")]
    pub duration_seconds: u32,
    /// Script tone (premium, practical, mz, professional, ...)
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Optional target audience hint for the script provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    /// Voice preset key for narration synthesis
    #[serde(default = "default_voice_preset")]
    pub voice_preset: String,
    /// Target aspect ratio
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Export target
    #[serde(default)]
    pub export_format: ExportFormat,
    /// Use the generative music provider instead of the stock library
    #[serde(default)]
    pub use_generative_music: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration(),
            tone: default_tone(),
            target_audience: None,
            voice_preset: default_voice_preset(),
            aspect_ratio: AspectRatio::default(),
            export_format: ExportFormat::default(),
            use_generative_music: false,
        }
    }
}
