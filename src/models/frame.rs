use crate::error::{DoodleError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// A generation attempt with fewer frames than this is a failure.
pub const MIN_FRAMES: usize = 2;
/// Streaming stops as soon as this many frames have been collected.
pub const MAX_FRAMES: usize = 8;

pub const DEFAULT_FRAME_MIME: &str = "image/png";

/// User-supplied description of the animation, validated and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn parse(text: &str, max_chars: usize) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DoodleError::validation("Prompt cannot be empty"));
        }
        if trimmed.chars().count() > max_chars {
            return Err(DoodleError::validation(format!(
                "Prompt must be less than {} characters",
                max_chars
            )));
        }
        Ok(Prompt(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One encoded still image of the animation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    sequence_number: u32,
    mime_type: String,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(sequence_number: u32, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            sequence_number,
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    pub fn from_data_url(sequence_number: u32, url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| DoodleError::decode(format!("frame {}: not a data URL", sequence_number)))?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            DoodleError::decode(format!("frame {}: data URL has no payload", sequence_number))
        })?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            DoodleError::decode(format!("frame {}: data URL is not base64", sequence_number))
        })?;
        let mime_type = if mime_type.is_empty() {
            DEFAULT_FRAME_MIME
        } else {
            mime_type
        };
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| DoodleError::decode(format!("frame {}: {}", sequence_number, e)))?;
        Ok(Frame::new(sequence_number, mime_type, data))
    }
}

/// Ordered frames of one generation, capped at [`MAX_FRAMES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from frames supplied by a caller; order is preserved as given.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Appends the next frame, numbering it by arrival. Returns `None` once the set is full.
    pub fn push_payload(&mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Option<&Frame> {
        if self.is_full() {
            return None;
        }
        let sequence_number = self.frames.len() as u32 + 1;
        self.frames.push(Frame::new(sequence_number, mime_type, data));
        self.frames.last()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= MAX_FRAMES
    }

    pub fn is_acceptable(&self) -> bool {
        self.frames.len() >= MIN_FRAMES
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Successful outcome of the generation path.
#[derive(Debug, Clone)]
pub struct GeneratedFrames {
    pub frames: FrameSet,
    pub expanded_prompt: String,
}

impl GeneratedFrames {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// A finished GIF byte stream plus the parameters it was encoded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedAnimation {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub frame_delay_ms: u32,
}

impl EncodedAnimation {
    pub const MEDIA_TYPE: &'static str = "image/gif";

    pub fn media_type(&self) -> &'static str {
        Self::MEDIA_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn download_file_name(&self) -> String {
        format!("doodle-{}.gif", chrono::Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_rejects_blank_and_oversize() {
        let err = Prompt::parse("   \n\t", 500).unwrap_err();
        assert_eq!(err.to_string(), "Prompt cannot be empty");

        let long = "a".repeat(501);
        let err = Prompt::parse(&long, 500).unwrap_err();
        assert_eq!(err.to_string(), "Prompt must be less than 500 characters");

        assert_eq!(Prompt::parse("  a cat waving ", 500).unwrap().as_str(), "a cat waving");
    }

    #[test]
    fn prompt_length_counts_characters_not_bytes() {
        let emoji = "🐱".repeat(10);
        assert!(Prompt::parse(&emoji, 10).is_ok());
    }

    #[test]
    fn frame_set_numbers_by_arrival_and_caps() {
        let mut set = FrameSet::new();
        for i in 0..MAX_FRAMES {
            let frame = set.push_payload("image/png", vec![i as u8]).unwrap();
            assert_eq!(frame.sequence_number(), i as u32 + 1);
        }
        assert!(set.is_full());
        assert!(set.push_payload("image/png", vec![99]).is_none());
        assert_eq!(set.len(), MAX_FRAMES);
    }

    #[test]
    fn acceptance_threshold() {
        let mut set = FrameSet::new();
        set.push_payload("image/png", vec![1]);
        assert!(!set.is_acceptable());
        set.push_payload("image/png", vec![2]);
        assert!(set.is_acceptable());
    }

    #[test]
    fn data_url_keeps_mime_and_payload() {
        let frame = Frame::new(3, "image/jpeg", vec![0xFF, 0xD8, 0x00]);
        let url = frame.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(Frame::from_data_url(3, &url).unwrap(), frame);
    }

    #[test]
    fn malformed_data_url_is_decode_error() {
        for bad in ["image/png;base64,AAAA", "data:image/png,AAAA", "data:image/png;base64,@@@"] {
            assert!(matches!(
                Frame::from_data_url(1, bad),
                Err(DoodleError::DecodeError(_))
            ));
        }
    }
}
