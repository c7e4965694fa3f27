use crate::{
    config::GeminiConfig,
    error::{DoodleError, Result},
    gemini::Transport,
    models::gemini::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part},
};

#[derive(Clone)]
pub struct TextClient {
    transport: Transport,
    model: String,
    temperature: f32,
}

impl TextClient {
    pub(crate) fn new(transport: Transport, config: &GeminiConfig) -> Self {
        Self {
            transport,
            model: config.text_model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Rewrites `prompt` under `system_instruction` and returns the generated text.
    pub async fn expand(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(system_instruction)],
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_modalities: None,
            },
        };

        log::info!("Expanding prompt with model: {}", self.model);
        let url = self.transport.url(&self.model, "generateContent");
        let response = self.transport.post(&url, &request).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DoodleError::upstream(format!("malformed expansion response: {}", e)))?;

        let text = body.text();
        let text = text.trim();
        if text.is_empty() {
            return Err(DoodleError::upstream("prompt expansion returned no text"));
        }
        log::debug!("Expansion: {}", text);
        Ok(text.to_string())
    }
}
