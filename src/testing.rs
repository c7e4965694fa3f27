//! Scripted generative backend and raster fixtures shared by unit tests.

use crate::error::{DoodleError, Result};
use crate::gemini::{ChunkStream, GenerativeBackend};
use crate::models::{ChunkPart, FrameChunk};
use async_trait::async_trait;
use futures::StreamExt;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum Step {
    Images(usize),
    Text(&'static str),
    Fault(&'static str),
}

pub struct ScriptedBackend {
    pub expansion: std::result::Result<String, String>,
    pub open_error: Option<String>,
    pub script: Vec<Step>,
    pub single_images: Mutex<Vec<Result<FrameChunk>>>,
    pub calls: AtomicUsize,
    pub pulled: Arc<AtomicUsize>,
    pub last_instruction: Mutex<Option<String>>,
}

impl ScriptedBackend {
    pub fn new(expansion: &str, script: Vec<Step>) -> Self {
        Self {
            expansion: Ok(expansion.to_string()),
            open_error: None,
            script,
            single_images: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            pulled: Arc::new(AtomicUsize::new(0)),
            last_instruction: Mutex::new(None),
        }
    }

    /// A stream yielding `n` chunks with one image each.
    pub fn images(n: usize) -> Self {
        Self::new("a cartoon cat waving", (0..n).map(|_| Step::Images(1)).collect())
    }

    pub fn failing_expansion(message: &str) -> Self {
        let mut backend = Self::new("", Vec::new());
        backend.expansion = Err(message.to_string());
        backend
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pulled_count(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn expand_prompt(&self, _prompt: &str, _system_instruction: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.expansion.clone().map_err(DoodleError::upstream)
    }

    async fn stream_frames(&self, instruction: &str) -> Result<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_instruction.lock() {
            *last = Some(instruction.to_string());
        }
        if let Some(message) = &self.open_error {
            return Err(DoodleError::upstream(message.clone()));
        }

        let mut next_shade = 0u8;
        let items: Vec<Result<FrameChunk>> = self
            .script
            .iter()
            .map(|step| match step {
                Step::Images(count) => {
                    let parts = (0..*count)
                        .map(|_| {
                            next_shade = next_shade.wrapping_add(20);
                            ChunkPart::Image {
                                mime_type: "image/png".to_string(),
                                data: png_bytes(4, 4, [next_shade, 0, 255 - next_shade, 255]),
                            }
                        })
                        .collect();
                    Ok(FrameChunk::new(parts))
                }
                Step::Text(text) => Ok(FrameChunk::text(*text)),
                Step::Fault(message) => Err(DoodleError::upstream(*message)),
            })
            .collect();

        let pulled = Arc::clone(&self.pulled);
        // a real stream ends at its first fault
        let stream = futures::stream::iter(items)
            .scan(false, |faulted, item| {
                if *faulted {
                    return futures::future::ready(None);
                }
                *faulted = item.is_err();
                futures::future::ready(Some(item))
            })
            .inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            });
        Ok(Box::pin(stream))
    }

    async fn generate_image(&self, _prompt: &str) -> Result<FrameChunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self
            .single_images
            .lock()
            .map_err(|_| DoodleError::unknown("script lock poisoned"))?;
        if queue.is_empty() {
            return Err(DoodleError::upstream("script exhausted"));
        }
        queue.remove(0)
    }
}

pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding of a fixture");
    bytes
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&solid_image(width, height, color))
}
