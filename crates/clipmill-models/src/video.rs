//! Source video models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for an uploaded source video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored, uploaded source video.
///
/// Created once at upload and immutable thereafter. Every clip spawned from
/// it carries the `VideoId` as a reference; the source is never owned by a
/// clip. `duration_seconds` is authoritative: clips inherit it unless their
/// style resamples playback speed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceVideo {
    /// Unique video ID
    pub id: VideoId,

    /// Location of the stored media file
    pub path: PathBuf,

    /// Duration in seconds
    pub duration_seconds: f64,

    /// Container format (e.g. "mp4")
    pub format: String,

    /// File size in bytes
    pub size_bytes: u64,
}

impl SourceVideo {
    /// Create a new source video record.
    pub fn new(
        id: VideoId,
        path: impl Into<PathBuf>,
        duration_seconds: f64,
        format: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            duration_seconds,
            format: format.into(),
            size_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_video_id_serde_transparent() {
        let id = VideoId::from_string("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }
}
