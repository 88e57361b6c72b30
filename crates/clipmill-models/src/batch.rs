//! Batch aggregates derived from member clip statuses.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Clip, ClipStatus, VideoId};

/// Aggregate status of a batch, derived from member clip statuses.
///
/// Partial completion is a first-class terminal state, not an error: a batch
/// where some clips failed and the rest completed is `PartiallyFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every member is still pending
    Pending,
    /// At least one member is pending or processing
    Processing,
    /// Every member reached `completed`
    Completed,
    /// Every member is terminal and at least one failed
    PartiallyFailed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::PartiallyFailed => "partially_failed",
        }
    }

    /// Check if the batch reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::PartiallyFailed)
    }

    /// Derive the aggregate from member statuses.
    ///
    /// An empty slice never occurs in practice (batch requests are rejected
    /// before creating zero clips) but derives to `Pending` for totality.
    pub fn from_members(statuses: &[ClipStatus]) -> Self {
        if statuses.iter().all(|s| *s == ClipStatus::Pending) {
            return BatchStatus::Pending;
        }
        if statuses.iter().any(|s| !s.is_terminal()) {
            return BatchStatus::Processing;
        }
        if statuses.iter().all(|s| *s == ClipStatus::Completed) {
            BatchStatus::Completed
        } else {
            BatchStatus::PartiallyFailed
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of clips spawned from one generation request against one source
/// video, with its derived aggregate status.
///
/// A batch has no lifecycle of its own; it is recomputed from current member
/// state on every read.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipBatch {
    /// Source video the batch was generated from
    pub video_id: VideoId,

    /// Member clips, in request order
    pub clips: Vec<Clip>,
}

impl ClipBatch {
    /// Build a batch snapshot from member clips.
    pub fn new(video_id: VideoId, clips: Vec<Clip>) -> Self {
        Self { video_id, clips }
    }

    /// Derived aggregate status.
    pub fn status(&self) -> BatchStatus {
        let statuses: Vec<ClipStatus> = self.clips.iter().map(|c| c.status).collect();
        BatchStatus::from_members(&statuses)
    }

    /// Number of completed member clips.
    pub fn completed_count(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| c.status == ClipStatus::Completed)
            .count()
    }

    /// Number of failed member clips.
    pub fn failed_count(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| c.status == ClipStatus::Failed)
            .count()
    }

    /// Human-readable progress line, e.g. "3/10 completed, 1 failed".
    pub fn summary(&self) -> String {
        format!(
            "{}/{} completed, {} failed",
            self.completed_count(),
            self.clips.len(),
            self.failed_count()
        )
    }
}
