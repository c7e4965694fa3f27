use crate::{
    config::GeminiConfig,
    error::{DoodleError, Result},
    gemini::{sse::SseDecoder, ChunkStream, Transport},
    models::{
        gemini::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Modality},
        FrameChunk,
    },
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

#[derive(Clone)]
pub struct ImageClient {
    transport: Transport,
    model: String,
    temperature: f32,
}

impl ImageClient {
    pub(crate) fn new(transport: Transport, config: &GeminiConfig) -> Self {
        Self {
            transport,
            model: config.image_model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, instruction: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(instruction)],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_modalities: Some(vec![Modality::Image, Modality::Text]),
            },
        }
    }

    /// Single non-streamed image generation.
    pub async fn generate(&self, prompt: &str) -> Result<FrameChunk> {
        let request = self.build_request(prompt);
        log::info!("Generating image with model: {}", self.model);

        let url = self.transport.url(&self.model, "generateContent");
        let response = self.transport.post(&url, &request).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DoodleError::upstream(format!("malformed image response: {}", e)))?;
        Ok(FrameChunk::from_response(body))
    }

    /// Opens a streamed generation. The returned stream ends after the first
    /// fault; dropping it stops the reader task and releases the connection.
    pub async fn generate_stream(&self, instruction: &str) -> Result<ChunkStream> {
        let request = self.build_request(instruction);
        log::info!("Invoking streaming model: {}", self.model);

        let url = format!("{}?alt=sse", self.transport.url(&self.model, "streamGenerateContent"));
        let response = self.transport.post(&url, &request).await?;

        Ok(spawn_reader(Box::pin(response.bytes_stream())))
    }
}

/// Decodes an SSE body into chunks on a spawned task. The task sends at most
/// one fault, then stops; it also stops as soon as the returned stream is dropped.
pub(crate) fn spawn_reader<S, B, E>(mut body: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        while let Some(next) = body.next().await {
            match next {
                Ok(bytes) => {
                    for event in decoder.push(bytes.as_ref()) {
                        let chunk = FrameChunk::parse_json(&event);
                        let faulted = chunk.is_err();
                        if tx.send(chunk).await.is_err() || faulted {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let message = format!("stream interrupted: {}", e);
                    let _ = tx.send(Err(DoodleError::upstream(message))).await;
                    return;
                }
            }
        }
        if let Some(event) = decoder.finish() {
            let _ = tx.send(FrameChunk::parse_json(&event)).await;
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FRAME: &str = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"AQID"}}]}}]}"#;

    fn event(json: &str) -> Vec<u8> {
        format!("data: {}\r\n\r\n", json).into_bytes()
    }

    #[tokio::test]
    async fn reader_yields_chunks_in_order() {
        let body = futures::stream::iter(vec![
            Ok::<_, String>(event(FRAME)),
            Ok(event(r#"{"candidates":[{"content":{"parts":[{"text":"done"}]}}]}"#)),
        ]);
        let chunks: Vec<_> = spawn_reader(body).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].as_ref().unwrap().has_image());
        assert!(!chunks[1].as_ref().unwrap().has_image());
    }

    #[tokio::test]
    async fn reader_stops_after_first_fault() {
        let body = futures::stream::iter(vec![
            Ok::<_, String>(event(FRAME)),
            Ok(event("{not json")),
            Ok(event(FRAME)),
        ]);
        let chunks: Vec<_> = spawn_reader(body).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(matches!(chunks[1], Err(DoodleError::UpstreamError(_))));
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let body = futures::stream::iter(vec![
            Ok(event(FRAME)),
            Err("connection reset".to_string()),
            Ok(event(FRAME)),
        ]);
        let chunks: Vec<_> = spawn_reader(body).collect().await;
        assert_eq!(chunks.len(), 2);
        match &chunks[1] {
            Err(e) => assert!(e.to_string().contains("connection reset")),
            Ok(_) => panic!("expected a fault"),
        }
    }

    #[tokio::test]
    async fn reader_stops_when_stream_is_dropped() {
        let (body_tx, body_rx) = tokio::sync::mpsc::channel::<std::result::Result<Vec<u8>, String>>(4);
        let mut chunks = spawn_reader(ReceiverStream::new(body_rx));

        body_tx.send(Ok(event(FRAME))).await.unwrap();
        assert!(chunks.next().await.unwrap().is_ok());
        drop(chunks);

        // the next event finds the receiver gone and the task releases the body
        body_tx.send(Ok(event(FRAME))).await.unwrap();
        let released = tokio::time::timeout(Duration::from_secs(2), body_tx.closed()).await;
        assert!(released.is_ok());
    }
}
