use crate::{
    config::{Config, EncoderConfig},
    encoder,
    error::{DoodleError, Result},
    gemini::GenerativeBackend,
    logger,
    models::{EncodedAnimation, FrameSet, GeneratedFrames, MAX_FRAMES, MIN_FRAMES},
    source::FrameSource,
};
use std::sync::Arc;
use uuid::Uuid;

/// Runs the two independent paths: prompt to frames, and frames to GIF.
///
/// Holds no per-run state; concurrent runs each own their frames and canvas.
/// No retries are made here.
#[derive(Clone)]
pub struct Pipeline {
    source: FrameSource,
    encoder: EncoderConfig,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &Config) -> Self {
        let source = FrameSource::new(backend)
            .with_mode(config.generation_mode)
            .with_max_prompt_chars(config.max_prompt_chars);
        Self {
            source,
            encoder: config.encoder,
        }
    }

    pub fn encoder_config(&self) -> &EncoderConfig {
        &self.encoder
    }

    pub async fn run_generation(&self, prompt: &str) -> Result<GeneratedFrames> {
        self.run_generation_with_progress(prompt, |_| {}).await
    }

    pub async fn run_generation_with_progress<F>(&self, prompt: &str, on_frame: F) -> Result<GeneratedFrames>
    where
        F: FnMut(usize) + Send,
    {
        let run_id = Uuid::new_v4();
        log::info!("[run:{}] Starting generation for prompt: \"{}\"", run_id, prompt.trim());
        let _timer = logger::timer(&format!("generation {}", run_id));

        match self.source.generate_frames_with_progress(prompt, on_frame).await {
            Ok(generated) => {
                log::info!("[run:{}] Generated {} frames", run_id, generated.frame_count());
                Ok(generated)
            }
            Err(e) => {
                log::error!("[run:{}] Generation failed ({}): {}", run_id, e.kind(), e);
                Err(e)
            }
        }
    }

    pub fn run_export(&self, frames: &FrameSet) -> Result<EncodedAnimation> {
        self.run_export_with(frames, &self.encoder)
    }

    /// Export with per-call canvas and frame-rate overrides.
    pub fn run_export_with(&self, frames: &FrameSet, config: &EncoderConfig) -> Result<EncodedAnimation> {
        if frames.len() < MIN_FRAMES || frames.len() > MAX_FRAMES {
            return Err(DoodleError::validation(format!(
                "Need between {} and {} frames to export, got {}",
                MIN_FRAMES,
                MAX_FRAMES,
                frames.len()
            )));
        }
        let _timer = logger::timer("gif export");
        encoder::encode(frames, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frame;
    use crate::testing::{png_bytes, ScriptedBackend};

    fn pipeline(backend: ScriptedBackend) -> Pipeline {
        let config = Config::new().with_encoder(EncoderConfig::new().with_size(8, 8));
        Pipeline::new(Arc::new(backend), &config)
    }

    #[tokio::test]
    async fn generation_passes_results_through() {
        let result = pipeline(ScriptedBackend::images(5)).run_generation("a cat waving").await.unwrap();
        assert_eq!(result.frame_count(), 5);

        let err = pipeline(ScriptedBackend::images(1)).run_generation("a cat").await.unwrap_err();
        assert!(matches!(err, DoodleError::InsufficientFramesError { count: 1, .. }));
    }

    #[tokio::test]
    async fn generated_frames_export_to_gif() {
        let pipeline = pipeline(ScriptedBackend::images(6));
        let generated = pipeline.run_generation("a cat").await.unwrap();
        let animation = pipeline.run_export(&generated.frames).unwrap();
        assert_eq!(animation.frame_count, 6);
        assert_eq!((animation.width, animation.height), (8, 8));
        assert!(animation.bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn export_enforces_frame_bounds() {
        let pipeline = pipeline(ScriptedBackend::images(0));
        let frames = |n: u32| {
            FrameSet::from_frames(
                (1..=n)
                    .map(|i| Frame::new(i, "image/png", png_bytes(2, 2, [0, 0, 0, 255])))
                    .collect(),
            )
        };
        for n in [0, 1, 9] {
            assert!(matches!(
                pipeline.run_export(&frames(n)),
                Err(DoodleError::ValidationError(_))
            ));
        }
        assert!(pipeline.run_export(&frames(2)).is_ok());
        assert!(pipeline.run_export(&frames(8)).is_ok());
    }
}
