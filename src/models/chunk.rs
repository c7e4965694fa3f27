use crate::error::{DoodleError, Result};
use crate::models::frame::DEFAULT_FRAME_MIME;
use crate::models::gemini::GenerateContentResponse;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// One validated part of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPart {
    Image { mime_type: String, data: Vec<u8> },
    Text(String),
}

/// One streamed response event, already checked and base64-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameChunk {
    pub parts: Vec<ChunkPart>,
}

impl FrameChunk {
    pub fn new(parts: Vec<ChunkPart>) -> Self {
        Self { parts }
    }

    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(vec![ChunkPart::Image {
            mime_type: mime_type.into(),
            data,
        }])
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ChunkPart::Text(text.into())])
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, ChunkPart::Image { .. }))
    }

    /// Image payloads in the order they appeared; text is dropped.
    pub fn into_images(self) -> impl Iterator<Item = (String, Vec<u8>)> {
        self.parts.into_iter().filter_map(|part| match part {
            ChunkPart::Image { mime_type, data } => Some((mime_type, data)),
            ChunkPart::Text(_) => None,
        })
    }

    /// Validates a raw response into the tagged form. Only the first candidate
    /// is read; an image part with an unreadable payload is skipped on its own.
    pub fn from_response(response: GenerateContentResponse) -> Self {
        let mut parts = Vec::new();
        for part in response.first_parts() {
            if let Some(inline) = &part.inline_data {
                let data = match STANDARD.decode(inline.data.trim()) {
                    Ok(data) => data,
                    Err(e) => {
                        log::warn!("Skipping inline image with invalid base64: {}", e);
                        continue;
                    }
                };
                if data.is_empty() {
                    continue;
                }
                let mime_type = inline
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FRAME_MIME.to_string());
                parts.push(ChunkPart::Image { mime_type, data });
            } else if let Some(text) = &part.text {
                parts.push(ChunkPart::Text(text.clone()));
            }
        }
        if let Some(reason) = response.finish_reason().filter(|r| *r != "STOP") {
            log::warn!("Candidate finished with reason {}", reason);
        }
        FrameChunk { parts }
    }

    pub fn parse_json(raw: &str) -> Result<Self> {
        let response: GenerateContentResponse = serde_json::from_str(raw)
            .map_err(|e| DoodleError::upstream(format!("malformed stream chunk: {}", e)))?;
        Ok(Self::from_response(response))
    }
}
