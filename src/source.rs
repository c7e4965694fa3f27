//! Turns one prompt into an ordered set of generated frames.
//!
//! Two calls are made to the generative service: a text call that expands the
//! prompt under a fixed style policy, then a streamed multimodal call whose
//! inline images become frames in arrival order. Reading stops at
//! [`MAX_FRAMES`]; a fault mid-stream keeps what was already collected; fewer
//! than [`MIN_FRAMES`] frames fails the attempt.

use crate::{
    config::GenerationMode,
    error::{DoodleError, Result},
    gemini::GenerativeBackend,
    models::{FrameSet, GeneratedFrames, Prompt, MAX_FRAMES, MIN_FRAMES},
    prompts,
};
use futures::StreamExt;
use std::sync::Arc;

#[derive(Clone)]
pub struct FrameSource {
    backend: Arc<dyn GenerativeBackend>,
    mode: GenerationMode,
    max_prompt_chars: usize,
}

impl FrameSource {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            mode: GenerationMode::Streamed,
            max_prompt_chars: 500,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_prompt_chars(mut self, max: usize) -> Self {
        self.max_prompt_chars = max;
        self
    }

    pub async fn generate_frames(&self, prompt: &str) -> Result<GeneratedFrames> {
        self.generate_frames_with_progress(prompt, |_| {}).await
    }

    /// Like [`generate_frames`](Self::generate_frames), calling `on_frame` with
    /// the running count after each accepted frame.
    pub async fn generate_frames_with_progress<F>(
        &self,
        prompt: &str,
        mut on_frame: F,
    ) -> Result<GeneratedFrames>
    where
        F: FnMut(usize) + Send,
    {
        let prompt = Prompt::parse(prompt, self.max_prompt_chars)?;

        let expansion = self
            .backend
            .expand_prompt(prompt.as_str(), prompts::SYSTEM_INSTRUCTION)
            .await?;
        let expanded_prompt = prompts::enhance(&expansion);
        log::info!("Enhanced prompt: {}", expanded_prompt);

        let frames = match self.mode {
            GenerationMode::Streamed => self.collect_streamed(&expanded_prompt, &mut on_frame).await?,
            GenerationMode::PerFrame { frames } => {
                self.collect_per_frame(&expanded_prompt, frames, &mut on_frame)
                    .await?
            }
        };

        if !frames.is_acceptable() {
            log::warn!("Only {} frame(s) generated", frames.len());
            return Err(DoodleError::InsufficientFramesError {
                count: frames.len(),
                min: MIN_FRAMES,
            });
        }

        log::info!("Successfully generated {} frames", frames.len());
        Ok(GeneratedFrames {
            frames,
            expanded_prompt,
        })
    }

    async fn collect_streamed<F>(&self, expanded_prompt: &str, on_frame: &mut F) -> Result<FrameSet>
    where
        F: FnMut(usize) + Send,
    {
        let instruction = prompts::frame_instruction(expanded_prompt);
        let mut stream = self.backend.stream_frames(&instruction).await?;
        let mut frames = FrameSet::new();

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) if frames.is_empty() => return Err(e),
                Err(e) => {
                    log::warn!(
                        "Stream processing error after {} frame(s), continuing with them: {}",
                        frames.len(),
                        e
                    );
                    break;
                }
            };

            for (mime_type, data) in chunk.into_images() {
                let Some(frame) = frames.push_payload(mime_type, data) else {
                    break;
                };
                let count = frame.sequence_number() as usize;
                log::info!("Generated frame {}", count);
                on_frame(count);

                if frames.is_full() {
                    log::info!("Reached maximum frame limit ({})", MAX_FRAMES);
                    // remaining chunks are never awaited; dropping the stream ends the read
                    return Ok(frames);
                }
            }
        }

        Ok(frames)
    }

    async fn collect_per_frame<F>(
        &self,
        expanded_prompt: &str,
        total: usize,
        on_frame: &mut F,
    ) -> Result<FrameSet>
    where
        F: FnMut(usize) + Send,
    {
        let total = total.clamp(1, MAX_FRAMES);
        let mut frames = FrameSet::new();

        for n in 1..=total {
            let prompt = prompts::frame_phase_prompt(expanded_prompt, n, total);
            let chunk = match self.backend.generate_image(&prompt).await {
                Ok(chunk) => chunk,
                Err(e) if frames.is_empty() => return Err(e),
                Err(e) => {
                    log::warn!("Error generating frame {}, stopping: {}", n, e);
                    break;
                }
            };

            match chunk.into_images().next() {
                Some((mime_type, data)) => {
                    if let Some(frame) = frames.push_payload(mime_type, data) {
                        let count = frame.sequence_number() as usize;
                        log::info!("Generated frame {}", count);
                        on_frame(count);
                    }
                }
                None => log::warn!("No image generated for frame {}", n),
            }
        }

        Ok(frames)
    }
}
