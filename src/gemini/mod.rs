pub mod image_client;
pub mod sse;
pub mod text_client;

use crate::{
    config::GeminiConfig,
    error::{DoodleError, Result},
    models::{gemini::ApiErrorEnvelope, gemini::GenerateContentRequest, FrameChunk},
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

pub use image_client::ImageClient;
pub use text_client::TextClient;

/// Lazily consumed, non-restartable sequence of validated response chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<FrameChunk>> + Send>>;

/// The generative service as seen by the frame source.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Stage 1: one non-streamed text call that rewrites the raw prompt.
    async fn expand_prompt(&self, prompt: &str, system_instruction: &str) -> Result<String>;

    /// Stage 2: one streamed multimodal call. Dropping the stream stops reading it.
    async fn stream_frames(&self, instruction: &str) -> Result<ChunkStream>;

    /// One non-streamed multimodal call, used when frames are requested one at a time.
    async fn generate_image(&self, prompt: &str) -> Result<FrameChunk>;
}

/// Shared HTTP plumbing for both clients.
#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Transport {
    fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .user_agent(concat!("doodlegif/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DoodleError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POSTs a request and returns the response once the status is known to be 2xx.
    pub(crate) async fn post(
        &self,
        url: &str,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| DoodleError::upstream(format!("request to generative service failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = describe_error(response.text().await.unwrap_or_default());
        log::error!("Generative service returned {}: {}", status, message);
        Err(DoodleError::upstream(format!(
            "generative service returned {}: {}",
            status.as_u16(),
            message
        )))
    }
}

/// Message of a Gemini error envelope with its status name, or the raw body.
fn describe_error(body: String) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body,
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let transport = Transport::new(config)?;
        Ok(Self {
            text_client: TextClient::new(transport.clone(), config),
            image_client: ImageClient::new(transport, config),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn expand_prompt(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        self.text_client.expand(prompt, system_instruction).await
    }

    async fn stream_frames(&self, instruction: &str) -> Result<ChunkStream> {
        self.image_client.generate_stream(instruction).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<FrameChunk> {
        self.image_client.generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_requires_api_key() {
        assert!(matches!(
            GeminiClient::new(&GeminiConfig::new()),
            Err(DoodleError::ConfigError(_))
        ));
    }

    #[test]
    fn error_bodies_are_summarised() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(describe_error(body.to_string()), "Permission denied (PERMISSION_DENIED)");
        assert_eq!(describe_error("upstream timeout".to_string()), "upstream timeout");
    }

    #[test]
    fn client_exposes_configured_models() {
        let config = GeminiConfig::new()
            .with_api_key("key")
            .with_models("text-model", "image-model");
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.text().model(), "text-model");
        assert_eq!(client.image().model(), "image-model");
    }

    #[test]
    fn urls_use_model_method_syntax() {
        let config = GeminiConfig::new()
            .with_api_key("key")
            .with_base_url("http://localhost:9000/v1beta/");
        let transport = Transport::new(&config).unwrap();
        assert_eq!(
            transport.url("gemini-2.0-flash", "generateContent"),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
