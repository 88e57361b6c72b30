//! Clip records and their status lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::{Style, VideoId};

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
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

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a clip.
///
/// Moves strictly forward through `Pending -> Processing -> {Completed|Failed}`.
/// The one sanctioned re-entry is a retry, which claims a `Failed` clip back
/// into `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// Clip record created, render not yet started
    #[default]
    Pending,
    /// Clip is being rendered
    Processing,
    /// Render completed successfully
    Completed,
    /// Render failed
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Pending => "pending",
            ClipStatus::Processing => "processing",
            ClipStatus::Completed => "completed",
            ClipStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no further transition without retry).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClipStatus::Completed | ClipStatus::Failed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: ClipStatus) -> bool {
        matches!(
            (self, next),
            (ClipStatus::Pending, ClipStatus::Processing)
                | (ClipStatus::Processing, ClipStatus::Completed)
                | (ClipStatus::Processing, ClipStatus::Failed)
                | (ClipStatus::Failed, ClipStatus::Processing)
        )
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One rendered output of one style applied to one source video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,

    /// Owning source video
    pub video_id: VideoId,

    /// Style applied to the source
    pub style: Style,

    /// Processing status
    #[serde(default)]
    pub status: ClipStatus,

    /// Output media location (set on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Thumbnail location (set on completion, absent if extraction failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,

    /// Playable duration in seconds (set on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    /// Error detail (set on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Wall-clock render time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_ms: Option<u64>,
}

impl Clip {
    /// Create a new pending clip for a (video, style) pair.
    pub fn pending(video_id: VideoId, style: Style) -> Self {
        let now = Utc::now();
        Self {
            id: ClipId::new(),
            video_id,
            style,
            status: ClipStatus::Pending,
            output_path: None,
            thumbnail_path: None,
            duration_seconds: None,
            error: None,
            created_at: now,
            updated_at: now,
            processing_ms: None,
        }
    }

    /// Mark as processing. Clears stale failure detail from a prior attempt.
    pub fn begin_processing(mut self) -> Self {
        self.status = ClipStatus::Processing;
        self.error = None;
        self.updated_at = Utc::now();
        self
    }

    /// Mark as completed with the rendered artifact locations.
    pub fn complete(
        mut self,
        output_path: PathBuf,
        thumbnail_path: Option<PathBuf>,
        duration_seconds: f64,
        processing_ms: u64,
    ) -> Self {
        self.status = ClipStatus::Completed;
        self.output_path = Some(output_path);
        self.thumbnail_path = thumbnail_path;
        self.duration_seconds = Some(duration_seconds);
        self.processing_ms = Some(processing_ms);
        self.updated_at = Utc::now();
        self
    }

    /// Mark as failed with an error detail.
    pub fn fail(mut self, error: impl Into<String>, processing_ms: u64) -> Self {
        self.status = ClipStatus::Failed;
        self.error = Some(error.into());
        self.processing_ms = Some(processing_ms);
        self.updated_at = Utc::now();
        self
    }
}
