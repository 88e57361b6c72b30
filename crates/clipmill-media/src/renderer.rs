//! The renderer seam: one call, one styled output.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clipmill_models::{SourceVideo, Style};

use crate::error::{MediaError, MediaResult};

/// A request to render one style of one source video.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// The resolved source video (must exist and be readable)
    pub source: SourceVideo,
    /// Style to apply
    pub style: Style,
    /// Where the output media file goes (parent directory must exist)
    pub output_path: PathBuf,
    /// Caption text for caption-bearing styles; ignored by others
    pub caption_text: Option<String>,
}

impl RenderRequest {
    /// Create a request, validating the filesystem contract up front.
    pub fn new(
        source: SourceVideo,
        style: Style,
        output_path: impl AsRef<Path>,
    ) -> MediaResult<Self> {
        let output_path = output_path.as_ref();

        if !source.path.exists() {
            return Err(MediaError::FileNotFound(source.path.clone()));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                return Err(MediaError::invalid_video(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        Ok(Self {
            source,
            style,
            output_path: output_path.to_path_buf(),
            caption_text: None,
        })
    }

    /// Attach caption text.
    pub fn with_caption(mut self, text: impl Into<String>) -> Self {
        self.caption_text = Some(text.into());
        self
    }

    /// Thumbnail path alongside the output media.
    pub fn thumbnail_path(&self) -> PathBuf {
        self.output_path.with_extension("jpg")
    }
}

/// A successfully rendered clip.
#[derive(Debug, Clone)]
pub struct RenderedClip {
    /// Output media location
    pub output_path: PathBuf,
    /// Thumbnail location; `None` when extraction failed (non-fatal)
    pub thumbnail_path: Option<PathBuf>,
    /// Playable duration of the output in seconds
    pub duration_seconds: f64,
    /// Wall-clock render time in milliseconds
    pub processing_ms: u64,
}

/// Transforms one source video into one styled output file plus thumbnail.
///
/// Implementations must never report success with a half-written output
/// path; on failure partial files may exist but no [`RenderedClip`] is
/// returned. Thumbnail extraction failure must NOT fail an otherwise
/// successful render.
#[async_trait]
pub trait StyleRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedClip>;
}
