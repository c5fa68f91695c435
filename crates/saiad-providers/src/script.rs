//! Script generation client backed by the Anthropic messages API.
//!
//! Prompts the model for a JSON ad script and extracts the JSON block from
//! the reply. Unparseable replies degrade to a canned tone-keyed fallback
//! script rather than failing the pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use saiad_models::{ProductInfo, Scene, Script};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::ScriptGenerator;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API response body.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Script generation client.
pub struct AnthropicScriptClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AnthropicScriptClient {
    /// Create a new client reading `ANTHROPIC_API_KEY` from the environment.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ProviderError::config("ANTHROPIC_API_KEY not set"))?;
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

    fn build_prompt(
        product: &ProductInfo,
        template_style: &str,
        duration_seconds: u32,
        tone: &str,
        target_audience: Option<&str>,
    ) -> String {
        let features = if product.features.is_empty() {
            "- (no feature information)".to_string()
        } else {
            product
                .features
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let audience = target_audience.unwrap_or("general consumers");

        format!(
            "You are a product advertisement copywriter. Write a script for a \
             {duration_seconds}-second ad video.\n\n\
             ## Product\n- Name: {name}\n- Category: {category}\n- Features:\n{features}\n\n\
             ## Requirements\n- Tone: {tone}\n- Template style: {template_style}\n\
             - Target audience: {audience}\n- Video length: {duration_seconds} seconds\n\n\
             ## Output format\nRespond with JSON only:\n\
             {{\"headline\": \"...\", \"subline\": \"...\", \"narration\": \"...\", \
             \"cta\": \"...\", \"scenes\": [{{\"order\": 1, \
             \"visual_description\": \"...\", \"narration\": \"...\", \"duration\": 10}}]}}",
            name = product.name,
            category = product.category,
        )
    }

    /// Extract the JSON object embedded in a model reply.
    fn extract_json(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end > start {
            Some(&text[start..=end])
        } else {
            None
        }
    }

    /// Canned script used when the model reply cannot be parsed.
    fn fallback_script(product: &ProductInfo, tone: &str) -> Script {
        let (subline, narration, cta) = match tone {
            "premium" => (
                "A new standard",
                format!(
                    "Meet the new {}. Innovative technology and refined design in perfect harmony.",
                    product.name
                ),
                "Discover it today",
            ),
            "practical" => (
                "The smart choice",
                format!(
                    "Everyday life gets easier with the {}. Top performance at a sensible price.",
                    product.name
                ),
                "See the details",
            ),
            _ => (
                "Made for you",
                format!("The {} everyone is talking about. Try it yourself.", product.name),
                "Check it out",
            ),
        };

        let scenes = vec![
            Scene {
                order: 1,
                visual_description: format!("{} hero shot, studio lighting", product.name),
                narration: narration.clone(),
                duration: None,
            },
            Scene {
                order: 2,
                visual_description: format!("{} in everyday use", product.name),
                narration: subline.to_string(),
                duration: None,
            },
            Scene {
                order: 3,
                visual_description: format!("{} closing shot with logo", product.name),
                narration: String::new(),
                duration: None,
            },
        ];

        Script {
            headline: product.name.clone(),
            subline: subline.to_string(),
            narration,
            cta: cta.to_string(),
            scenes,
        }
    }
}

#[async_trait]
impl ScriptGenerator for AnthropicScriptClient {
    async fn generate(
        &self,
        product: &ProductInfo,
        template_style: &str,
        duration_seconds: u32,
        tone: &str,
        target_audience: Option<&str>,
    ) -> ProviderResult<Script> {
        let prompt =
            Self::build_prompt(product, template_style, duration_seconds, tone, target_audience);

        let request = MessagesRequest {
            model: MODEL.to_string(),
            max_tokens: 1024,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(
                status,
                format!("Script generation failed: {}", body),
            ));
        }

        let body: MessagesResponse = response.json().await?;
        let text = body
            .content
            .first()
            .map(|b| b.text.as_str())
            .unwrap_or_default();

        match Self::extract_json(text).and_then(|json| serde_json::from_str::<Script>(json).ok()) {
            Some(script) => {
                debug!("Parsed script with {} scenes", script.scenes.len());
                Ok(script)
            }
            None => {
                warn!("Could not parse script from model reply, using fallback");
                Ok(Self::fallback_script(product, tone))
            }
        }
    }
}
