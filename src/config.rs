use crate::error::{DoodleError, Result};
use std::env;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_CANVAS_SIDE: u32 = 2048;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    /// Largest accepted canvas side; bounds the memory one export may claim.
    pub max_side: u32,
}

/// How stage 2 obtains its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// One streamed multimodal request; frames arrive as inline images.
    Streamed,
    /// One non-streamed image request per frame, each with a phase prompt.
    PerFrame { frames: usize },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_prompt_chars: usize,
    pub json_limit_bytes: usize,
    pub generation_mode: GenerationMode,
    pub gemini: GeminiConfig,
    pub encoder: EncoderConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            temperature: 1.0,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeminiConfig {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            temperature: defaults.temperature,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = text_model.into();
        self.image_model = image_model.into();
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DoodleError::ConfigError("GEMINI_API_KEY is required".into()))
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            width: 512,
            height: 512,
            fps: 4.0,
            max_side: DEFAULT_MAX_CANVAS_SIDE,
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        EncoderConfig {
            width: parse_env("GIF_WIDTH").unwrap_or(defaults.width),
            height: parse_env("GIF_HEIGHT").unwrap_or(defaults.height),
            fps: parse_env("GIF_FPS").unwrap_or(defaults.fps),
            max_side: parse_env("GIF_MAX_SIDE").unwrap_or(defaults.max_side),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_prompt_chars: 500,
            json_limit_bytes: 32 * 1024 * 1024,
            generation_mode: GenerationMode::Streamed,
            gemini: GeminiConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let per_frame_count = parse_env("PER_FRAME_COUNT").unwrap_or(5);
        let generation_mode = match env::var("GENERATION_MODE").ok().as_deref() {
            Some("per-frame") | Some("per_frame") => GenerationMode::PerFrame {
                frames: per_frame_count,
            },
            _ => GenerationMode::Streamed,
        };

        Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT").unwrap_or(defaults.port),
            max_prompt_chars: parse_env("MAX_PROMPT_CHARS").unwrap_or(defaults.max_prompt_chars),
            json_limit_bytes: parse_env("JSON_LIMIT_BYTES").unwrap_or(defaults.json_limit_bytes),
            generation_mode,
            gemini: GeminiConfig::from_env(),
            encoder: EncoderConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_prompt_chars(mut self, max: usize) -> Self {
        self.max_prompt_chars = max;
        self
    }

    pub fn with_generation_mode(mut self, mode: GenerationMode) -> Self {
        self.generation_mode = mode;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_encoder(mut self, config: EncoderConfig) -> Self {
        self.encoder = config;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
