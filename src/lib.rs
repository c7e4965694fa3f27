//! Doodle GIF generation on top of Gemini.
//!
//! A short prompt is expanded into a doodle description, a streamed image
//! generation call yields the frames, and the encoder turns an accepted frame
//! set into a looping GIF.

pub mod config;
pub mod encoder;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod source;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod testing;

pub use config::{Config, EncoderConfig, GeminiConfig, GenerationMode};
pub use encoder::encode;
pub use error::{DoodleError, Result};
pub use gemini::{ChunkStream, GeminiClient, GenerativeBackend, ImageClient, TextClient};
pub use models::*;
pub use pipeline::Pipeline;
pub use source::FrameSource;
