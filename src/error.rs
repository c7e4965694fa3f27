use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoodleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Upstream error: {0}")]
    UpstreamError(String),
    #[error("Only generated {count} frame(s). Need at least {min} for animation.")]
    InsufficientFramesError { count: usize, min: usize },
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("{0}")]
    UnknownError(String),
}

impl DoodleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DoodleError::ValidationError(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        DoodleError::UpstreamError(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        DoodleError::DecodeError(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        DoodleError::UnknownError(msg.into())
    }

    /// Stable name of the failure class, as reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            DoodleError::ConfigError(_) => "ConfigError",
            DoodleError::ValidationError(_) => "ValidationError",
            DoodleError::UpstreamError(_) => "UpstreamError",
            DoodleError::InsufficientFramesError { .. } => "InsufficientFramesError",
            DoodleError::DecodeError(_) => "DecodeError",
            DoodleError::UnknownError(_) => "UnknownError",
        }
    }

    /// True when the caller sent something unusable; everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DoodleError::ValidationError(_))
    }
}

impl From<reqwest::Error> for DoodleError {
    fn from(e: reqwest::Error) -> Self {
        DoodleError::UpstreamError(e.to_string())
    }
}

impl From<serde_json::Error> for DoodleError {
    fn from(e: serde_json::Error) -> Self {
        DoodleError::UnknownError(format!("serialization failed: {}", e))
    }
}

impl From<image::ImageError> for DoodleError {
    fn from(e: image::ImageError) -> Self {
        DoodleError::DecodeError(e.to_string())
    }
}

impl From<base64::DecodeError> for DoodleError {
    fn from(e: base64::DecodeError) -> Self {
        DoodleError::DecodeError(format!("invalid base64 payload: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, DoodleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_frames_message_carries_count() {
        let err = DoodleError::InsufficientFramesError { count: 0, min: 2 };
        assert_eq!(
            err.to_string(),
            "Only generated 0 frame(s). Need at least 2 for animation."
        );
        assert_eq!(err.kind(), "InsufficientFramesError");
    }

    #[test]
    fn validation_message_is_unprefixed() {
        let err = DoodleError::validation("Prompt cannot be empty");
        assert_eq!(err.to_string(), "Prompt cannot be empty");
        assert!(err.is_client_error());
        assert!(!DoodleError::upstream("boom").is_client_error());
    }
}
