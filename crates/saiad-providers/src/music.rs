//! Background music selection: stock library and Suno generation client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{MusicSelector, MusicTrack};

const DEFAULT_BASE_URL: &str = "https://api.sunoai.com";

/// Music mood categories used to match tracks to products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicMood {
    Tech,
    Dramatic,
    Calm,
    Energetic,
    Inspiring,
}

impl MusicMood {
    /// Mood for a product category. Unknown categories map to Tech.
    pub fn for_category(category: &str) -> Self {
        match category {
            "smartphone" => MusicMood::Tech,
            "tv" => MusicMood::Dramatic,
            "appliance" => MusicMood::Calm,
            "wearable" => MusicMood::Energetic,
            "tablet" => MusicMood::Inspiring,
            _ => MusicMood::Tech,
        }
    }

    /// Generation prompt for this mood.
    fn prompt(&self) -> &'static str {
        match self {
            MusicMood::Tech => {
                "Modern, sleek electronic music with subtle beats, clean and premium feel"
            }
            MusicMood::Dramatic => {
                "Cinematic orchestral music with rich strings, dramatic yet elegant"
            }
            MusicMood::Calm => "Calm, sophisticated ambient music, modern lifestyle feeling",
            MusicMood::Energetic => "Energetic, motivational electronic music, uplifting beats",
            MusicMood::Inspiring => "Inspiring corporate music, creative and productive mood",
        }
    }
}

/// One entry in the licensed stock library.
struct StockTrack {
    id: &'static str,
    url: &'static str,
    duration: f64,
    mood: MusicMood,
}

const STOCK_TRACKS: &[StockTrack] = &[
    StockTrack {
        id: "tech_upbeat",
        url: "/assets/music/tech_upbeat.mp3",
        duration: 60.0,
        mood: MusicMood::Tech,
    },
    StockTrack {
        id: "cinematic_premium",
        url: "/assets/music/cinematic_premium.mp3",
        duration: 90.0,
        mood: MusicMood::Dramatic,
    },
    StockTrack {
        id: "ambient_modern",
        url: "/assets/music/ambient_modern.mp3",
        duration: 120.0,
        mood: MusicMood::Calm,
    },
    StockTrack {
        id: "energetic_fitness",
        url: "/assets/music/energetic_fitness.mp3",
        duration: 60.0,
        mood: MusicMood::Energetic,
    },
    StockTrack {
        id: "inspiring_corporate",
        url: "/assets/music/inspiring_corporate.mp3",
        duration: 90.0,
        mood: MusicMood::Inspiring,
    },
];

/// Pre-licensed stock music library.
///
/// Zero-latency, deterministic, and infallible: every category resolves to
/// a track through the category-to-mood mapping.
#[derive(Debug, Clone, Default)]
pub struct StockMusicLibrary;

impl StockMusicLibrary {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic track lookup for a product category.
    pub fn track_for_category(&self, category: &str) -> MusicTrack {
        let mood = MusicMood::for_category(category);
        let track = STOCK_TRACKS
            .iter()
            .find(|t| t.mood == mood)
            .unwrap_or(&STOCK_TRACKS[0]);

        MusicTrack {
            id: Some(track.id.to_string()),
            url: track.url.to_string(),
            duration: track.duration,
        }
    }
}

#[async_trait]
impl MusicSelector for StockMusicLibrary {
    async fn select_or_generate(
        &self,
        category: &str,
        _duration_seconds: u32,
    ) -> ProviderResult<MusicTrack> {
        Ok(self.track_for_category(category))
    }

    fn is_stock(&self) -> bool {
        true
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TrackStatus {
    #[serde(default)]
    status: String,
    audio_url: Option<String>,
    duration: Option<f64>,
}

/// Generative music client backed by the Suno API.
pub struct SunoMusicClient {
    api_key: String,
    base_url: String,
    http: Client,
    poll_interval: Duration,
    max_wait: Duration,
}

impl SunoMusicClient {
    /// Create a new client reading `SUNO_API_KEY` from the environment.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("SUNO_API_KEY")
            .map_err(|_| ProviderError::config("SUNO_API_KEY not set"))?;
        Ok(Self::new(api_key, DEFAULT_BASE_URL))
    }

    /// Create a client with an explicit key and base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: Client::new(),
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(300),
        }
    }

    /// Override poll timing (tests use short intervals).
    pub fn with_polling(mut self, poll_interval: Duration, max_wait: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.max_wait = max_wait;
        self
    }

    async fn submit(&self, prompt: &str, duration_seconds: u32) -> ProviderResult<String> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "prompt": prompt,
                "duration": duration_seconds,
                "make_instrumental": true,
                "wait_audio": false,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(
                status,
                format!("Music generation failed: {}", body),
            ));
        }

        let body: GenerateResponse = response.json().await?;
        if body.id.is_empty() {
            return Err(ProviderError::invalid_response(
                "Music generation returned no task id",
            ));
        }
        Ok(body.id)
    }

    async fn poll_status(&self, task_id: &str) -> ProviderResult<TrackStatus> {
        let response = self
            .http
            .get(format!("{}/api/get?ids={}", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ProviderError::api(status, "Music status check failed"));
        }

        let mut items: Vec<TrackStatus> = response.json().await?;
        if items.is_empty() {
            return Err(ProviderError::invalid_response(
                "Music status returned no data",
            ));
        }
        Ok(items.remove(0))
    }
}

#[async_trait]
impl MusicSelector for SunoMusicClient {
    async fn select_or_generate(
        &self,
        category: &str,
        duration_seconds: u32,
    ) -> ProviderResult<MusicTrack> {
        let prompt = MusicMood::for_category(category).prompt();
        let task_id = self.submit(prompt, duration_seconds).await?;

        debug!("Music generation task {} submitted", task_id);

        let mut elapsed = Duration::ZERO;
        while elapsed < self.max_wait {
            let status = self.poll_status(&task_id).await?;
            match status.status.as_str() {
                "complete" => {
                    let url = status.audio_url.ok_or_else(|| {
                        ProviderError::invalid_response("Completed track has no audio URL")
                    })?;
                    return Ok(MusicTrack {
                        id: None,
                        url,
                        duration: status.duration.unwrap_or(duration_seconds as f64),
                    });
                }
                "error" => {
                    return Err(ProviderError::invalid_response("Music generation failed"));
                }
                _ => {}
            }
            tokio::time::sleep(self.poll_interval).await;
            elapsed += self.poll_interval;
        }

        Err(ProviderError::Timeout(
            "Timeout waiting for music generation".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn stock_lookup_maps_category_to_mood() {
        let library = StockMusicLibrary::new();

        let track = library.select_or_generate("smartphone", 30).await.unwrap();
        assert_eq!(track.id.as_deref(), Some("tech_upbeat"));

        let track = library.select_or_generate("tv", 30).await.unwrap();
        assert_eq!(track.id.as_deref(), Some("cinematic_premium"));

        // Unknown categories default to the tech track
        let track = library.select_or_generate("spaceship", 30).await.unwrap();
        assert_eq!(track.id.as_deref(), Some("tech_upbeat"));

        assert!(library.is_stock());
    }

    #[tokio::test]
    async fn generative_client_polls_to_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "task-1"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/get"))
            .and(query_param("ids", "task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"status": "complete", "audio_url": "https://cdn/music.mp3", "duration": 31.5}
            ])))
            .mount(&server)
            .await;

        let client = SunoMusicClient::new("key", server.uri())
            .with_polling(Duration::from_millis(10), Duration::from_secs(1));
        let track = client.select_or_generate("smartphone", 30).await.unwrap();

        assert_eq!(track.url, "https://cdn/music.mp3");
        assert_eq!(track.duration, 31.5);
        assert!(!client.is_stock());
    }

    #[tokio::test]
    async fn generative_failure_is_an_error_value() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let client = SunoMusicClient::new("key", server.uri());
        let err = client.select_or_generate("smartphone", 30).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 500, .. }));
    }
}
