//! Engine error types.

use clipmill_models::{ClipId, ClipStatus, VideoId};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Batch request rejected before any clip was created.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A status transition was attempted from the wrong state.
    #[error("Invalid state for clip {clip_id}: expected {expected}, found {actual}")]
    InvalidState {
        clip_id: ClipId,
        expected: ClipStatus,
        actual: ClipStatus,
    },

    #[error("Video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Media error: {0}")]
    Media(#[from] clipmill_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_state(clip_id: ClipId, expected: ClipStatus, actual: ClipStatus) -> Self {
        Self::InvalidState {
            clip_id,
            expected,
            actual,
        }
    }

    /// Check whether this is a request-validation fault (surfaced to the
    /// caller synchronously, never recorded on a clip).
    pub fn is_request_fault(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidRequest(_) | EngineError::VideoNotFound(_)
        )
    }
}
