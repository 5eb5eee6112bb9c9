// ABOUTME: Configuration module for the slidesmith application
// ABOUTME: Provides configuration settings and environment variable handling

use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/";
const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
const DEFAULT_STYLE: &str = "Professional";
const DEFAULT_TIMEOUT_MS: u64 = 60000;
const DEFAULT_PORT: u16 = 8080;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_style: String,
    pub timeout_ms: u64,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("generated"),
            default_style: DEFAULT_STYLE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let api_base_url = env::var("OPENAI_BASE_URL").unwrap_or(defaults.api_base_url);
        let text_model = env::var("SLIDESMITH_TEXT_MODEL").unwrap_or(defaults.text_model);
        let image_model = env::var("SLIDESMITH_IMAGE_MODEL").unwrap_or(defaults.image_model);
        let image_size = env::var("SLIDESMITH_IMAGE_SIZE").unwrap_or(defaults.image_size);
        let templates_dir = env::var("SLIDESMITH_TEMPLATES_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.templates_dir);
        let output_dir = env::var("SLIDESMITH_OUTPUT_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let default_style = env::var("SLIDESMITH_DEFAULT_STYLE").unwrap_or(defaults.default_style);
        let timeout_ms = env::var("SLIDESMITH_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let port = env::var("SLIDESMITH_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            api_key,
            api_base_url,
            text_model,
            image_model,
            image_size,
            templates_dir,
            output_dir,
            default_style,
            timeout_ms,
            port,
        }
    }

    /// Base URL with a trailing slash so relative endpoint joins keep the path
    pub fn normalized_base_url(&self) -> String {
        if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        }
    }
}
