//! Speech synthesis client backed by the ElevenLabs text-to-speech API.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{SpeechAudio, SpeechSynthesizer};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const MODEL_ID: &str = "eleven_multilingual_v2";

/// Preset key used when the requested key is unknown.
pub const DEFAULT_VOICE_PRESET: &str = "ko_professional_female";

/// Voice behind [`DEFAULT_VOICE_PRESET`].
const DEFAULT_VOICE: Voice = Voice {
    voice_id: "EXAVITQu4vr4xnSDxMaL",
    name: "Professional Female (ko)",
    language: "ko",
    style: "professional",
};

/// A provider voice, resolved from a preset key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub voice_id: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub style: &'static str,
}

fn voice_presets() -> &'static HashMap<&'static str, Voice> {
    static PRESETS: OnceLock<HashMap<&'static str, Voice>> = OnceLock::new();
    PRESETS.get_or_init(|| {
        HashMap::from([
            (
                "ko_professional_male",
                Voice {
                    voice_id: "pNInz6obpgDQGcFmaJgB",
                    name: "Professional Male (ko)",
                    language: "ko",
                    style: "professional",
                },
            ),
            (
                "ko_professional_female",
                Voice {
                    voice_id: "EXAVITQu4vr4xnSDxMaL",
                    name: "Professional Female (ko)",
                    language: "ko",
                    style: "professional",
                },
            ),
            (
                "ko_friendly_female",
                Voice {
                    voice_id: "21m00Tcm4TlvDq8ikWAM",
                    name: "Friendly Female (ko)",
                    language: "ko",
                    style: "friendly",
                },
            ),
            (
                "en_professional_male",
                Voice {
                    voice_id: "pNInz6obpgDQGcFmaJgB",
                    name: "Professional Male (en)",
                    language: "en",
                    style: "professional",
                },
            ),
            (
                "en_professional_female",
                Voice {
                    voice_id: "EXAVITQu4vr4xnSDxMaL",
                    name: "Professional Female (en)",
                    language: "en",
                    style: "professional",
                },
            ),
        ])
    })
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsSpeechClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl ElevenLabsSpeechClient {
    /// Create a new client reading `ELEVENLABS_API_KEY` from the environment.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| ProviderError::config("ELEVENLABS_API_KEY not set"))?;
        Ok(Self::new(api_key, DEFAULT_BASE_URL))
    }

    /// Create a client with an explicit key and base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeechClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> ProviderResult<SpeechAudio> {
        debug!("Synthesizing {} chars with voice {}", text.len(), voice_id);

        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": MODEL_ID,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(
                status,
                format!("Speech synthesis failed: {}", body),
            ));
        }

        let audio_data = response.bytes().await?.to_vec();
        Ok(SpeechAudio { audio_data })
    }

    fn preset_voice(&self, preset_key: &str) -> Voice {
        voice_presets()
            .get(preset_key)
            .cloned()
            .unwrap_or(DEFAULT_VOICE)
    }
}
