use crate::models::frame::{Frame, GeneratedFrames};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameDto {
    pub frame_number: u32,
    pub data_url: String,
}

impl From<&Frame> for FrameDto {
    fn from(frame: &Frame) -> Self {
        FrameDto {
            frame_number: frame.sequence_number(),
            data_url: frame.to_data_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub frame_count: usize,
    pub frames: Vec<FrameDto>,
    pub enhanced_prompt: String,
}

impl From<&GeneratedFrames> for GenerateResponse {
    fn from(generated: &GeneratedFrames) -> Self {
        GenerateResponse {
            success: true,
            frame_count: generated.frame_count(),
            frames: generated.frames.iter().map(FrameDto::from).collect(),
            enhanced_prompt: generated.expanded_prompt.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub frames: Vec<FrameDto>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
