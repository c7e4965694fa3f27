//! Animated GIF encoding of a frame set.
//!
//! Each frame is decoded, stretched onto a white square canvas, reduced to a
//! 256-colour rgb444 palette and appended as one image record. The canvas is a
//! single buffer owned by the encoder and redrawn per frame, so frames are
//! processed strictly one after another.

pub mod quantize;

use crate::{
    config::EncoderConfig,
    error::{DoodleError, Result},
    models::{EncodedAnimation, Frame, FrameSet},
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use std::borrow::Cow;

pub use quantize::{quantize, Palette, MAX_COLORS};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Encodes `frames` with the given canvas size and frame rate.
pub fn encode(frames: &FrameSet, config: &EncoderConfig) -> Result<EncodedAnimation> {
    GifEncoder::new(*config)?.encode(frames.frames())
}

/// Display time of one frame for a frame rate, `round(1000 / fps)` milliseconds.
pub fn frame_delay_ms(fps: f32) -> u32 {
    (1000.0 / fps as f64).round() as u32
}

pub struct GifEncoder {
    width: u32,
    height: u32,
    delay_ms: u32,
    canvas: RgbaImage,
    indices: Vec<u8>,
}

impl GifEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let max = config.max_side.min(u16::MAX as u32);
        if config.width == 0 || config.height == 0 || config.width > max || config.height > max {
            return Err(DoodleError::validation(format!(
                "Canvas size must be between 1x1 and {}x{}, got {}x{}",
                max, max, config.width, config.height
            )));
        }
        if !config.fps.is_finite() || config.fps <= 0.0 {
            return Err(DoodleError::validation(format!(
                "Frame rate must be positive, got {}",
                config.fps
            )));
        }

        Ok(Self {
            width: config.width,
            height: config.height,
            delay_ms: frame_delay_ms(config.fps),
            canvas: RgbaImage::from_pixel(config.width, config.height, WHITE),
            indices: Vec::with_capacity((config.width * config.height) as usize),
        })
    }

    pub fn frame_delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// GIF delays are in hundredths of a second.
    fn delay_centis(&self) -> u16 {
        (self.delay_ms.saturating_add(5) / 10).clamp(1, u16::MAX as u32) as u16
    }

    /// Encodes all frames or nothing: any decode failure discards the partial stream.
    pub fn encode(&mut self, frames: &[Frame]) -> Result<EncodedAnimation> {
        if frames.is_empty() {
            return Err(DoodleError::validation("No frames to encode"));
        }

        let width = self.width as u16;
        let height = self.height as u16;
        let delay = self.delay_centis();
        let mut writer: Option<gif::Encoder<Vec<u8>>> = None;

        for frame in frames {
            self.draw(frame)?;
            let palette = quantize(self.canvas.as_raw(), MAX_COLORS);
            palette.apply(self.canvas.as_raw(), &mut self.indices);
            let table = palette.to_rgb_bytes();

            let mut record = gif::Frame {
                width,
                height,
                delay,
                buffer: Cow::Borrowed(self.indices.as_slice()),
                ..gif::Frame::default()
            };

            match writer.as_mut() {
                Some(encoder) => {
                    record.palette = Some(table);
                    encoder.write_frame(&record).map_err(gif_error)?;
                }
                None => {
                    // the first frame's table doubles as the global colour table
                    let mut encoder =
                        gif::Encoder::new(Vec::new(), width, height, &table).map_err(gif_error)?;
                    encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_error)?;
                    encoder.write_frame(&record).map_err(gif_error)?;
                    writer = Some(encoder);
                }
            }
            log::debug!(
                "Encoded frame {} with {} colours",
                frame.sequence_number(),
                palette.len()
            );
        }

        let bytes = match writer {
            Some(encoder) => encoder
                .into_inner()
                .map_err(|e| DoodleError::unknown(format!("failed to finish GIF: {}", e)))?,
            None => return Err(DoodleError::validation("No frames to encode")),
        };

        log::info!(
            "Encoded {} frames into {} bytes ({}x{}, {}ms/frame)",
            frames.len(),
            bytes.len(),
            self.width,
            self.height,
            self.delay_ms
        );

        Ok(EncodedAnimation {
            bytes,
            width: self.width,
            height: self.height,
            frame_count: frames.len(),
            frame_delay_ms: self.delay_ms,
        })
    }

    /// Clears the canvas to opaque white and stretches the frame over it.
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let source = image::load_from_memory(frame.data()).map_err(|e| {
            DoodleError::decode(format!(
                "frame {} could not be decoded: {}",
                frame.sequence_number(),
                e
            ))
        })?;
        let resized = imageops::resize(&source, self.width, self.height, FilterType::Triangle);

        for pixel in self.canvas.pixels_mut() {
            *pixel = WHITE;
        }
        imageops::overlay(&mut self.canvas, &resized, 0, 0);
        Ok(())
    }
}

fn gif_error(e: gif::EncodingError) -> DoodleError {
    DoodleError::unknown(format!("GIF encoding failed: {}", e))
}
