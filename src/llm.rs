// ABOUTME: Generation collaborators for the slidesmith application
// ABOUTME: Defines text and image generation traits and an OpenAI-compatible HTTP client

use crate::config::Config;
use crate::errors::{DeckError, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Longest polished title kept
pub const MAX_TITLE_CHARS: usize = 100;

const TITLE_INSTRUCTIONS: &str = "You write presentation titles. Reply with one short, polished \
title (at most 10 words) for the described talk. No quotes, no punctuation at the end, no other text.";

/// Structured outline request handed to a text generator
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    pub system_instructions: String,
    pub user_prompt: String,
    pub count: usize,
}

/// Produces outline payloads and presentation titles
pub trait TextGenerator: Send + Sync {
    /// Return the raw JSON payload for an outline request
    fn generate_outline(&self, request: &OutlineRequest) -> Result<String>;

    /// Return a short polished title for a free-text description
    fn polish_title(&self, description: &str) -> Result<String>;
}

/// Where a generated image can be obtained from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResource {
    Remote(String),
    Inline(Vec<u8>),
}

/// Produces one illustration per prompt
pub trait ImageGenerator: Send + Sync {
    fn generate_image(&self, prompt: &str) -> Result<ImageResource>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

/// Client for an OpenAI-compatible chat and image API
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    text_model: String,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            DeckError::Config("OPENAI_API_KEY is not set".to_string())
        })?;
        let base_url = Url::parse(&config.normalized_base_url()).map_err(|e| {
            DeckError::Config(format!("Invalid API base URL {}: {}", config.api_base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DeckError::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(DeckError::Provider(format!("HTTP {}: {}", status, detail)));
        }

        response
            .json::<T>()
            .map_err(|e| DeckError::Provider(format!("Unreadable provider response: {}", e)))
    }

    fn chat(&self, system: &str, user: &str, json_output: bool) -> Result<String> {
        let request = ChatRequest {
            model: &self.text_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
            response_format: json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response: ChatResponse = self.post("chat/completions", &request)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DeckError::Provider("Completion contained no message".to_string()))
    }
}

impl TextGenerator for OpenAiClient {
    fn generate_outline(&self, request: &OutlineRequest) -> Result<String> {
        info!(
            "Requesting {} slides from {}",
            request.count, self.text_model
        );
        self.chat(&request.system_instructions, &request.user_prompt, true)
    }

    fn polish_title(&self, description: &str) -> Result<String> {
        let raw = self
            .chat(TITLE_INSTRUCTIONS, description, false)
            .map_err(|e| DeckError::TitlePolish(e.to_string()))?;
        clean_title(&raw)
    }
}

impl ImageGenerator for OpenAiClient {
    fn generate_image(&self, prompt: &str) -> Result<ImageResource> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
            response_format: "url",
        };

        let response: ImageResponse = self
            .post("images/generations", &request)
            .map_err(|e| DeckError::ImageAttachment(e.to_string()))?;

        response
            .data
            .into_iter()
            .find_map(|datum| datum.url)
            .map(ImageResource::Remote)
            .ok_or_else(|| DeckError::ImageAttachment("Provider returned no image".to_string()))
    }
}

/// Stand-in used when no provider key is configured.
///
/// Outline requests fail; title polishing and images degrade as usual.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl TextGenerator for OfflineProvider {
    fn generate_outline(&self, _request: &OutlineRequest) -> Result<String> {
        Err(DeckError::Config("OPENAI_API_KEY is not set".to_string()))
    }

    fn polish_title(&self, _description: &str) -> Result<String> {
        Err(DeckError::TitlePolish("no provider configured".to_string()))
    }
}

impl ImageGenerator for OfflineProvider {
    fn generate_image(&self, _prompt: &str) -> Result<ImageResource> {
        Err(DeckError::ImageAttachment("no provider configured".to_string()))
    }
}

/// Normalise a model-written title to a single clean line
pub fn clean_title(raw: &str) -> Result<String> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let line = line
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '#')
        .trim();
    let line = line.strip_prefix("Title:").unwrap_or(line).trim();

    if line.is_empty() {
        return Err(DeckError::TitlePolish("Empty title".to_string()));
    }

    Ok(line.chars().take(MAX_TITLE_CHARS).collect())
}
