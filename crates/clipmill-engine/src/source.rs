//! Source video resolution collaborator.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use clipmill_media::probe_video;
use clipmill_models::{SourceVideo, VideoId};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Resolves a video id to its stored source video.
///
/// Upload/storage is a collaborator: the engine only needs a readable file
/// plus authoritative duration and format.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve a video id. Fails with [`EngineError::VideoNotFound`] when
    /// the id is unknown or the backing file is missing.
    async fn resolve(&self, video_id: &VideoId) -> EngineResult<SourceVideo>;
}

/// Filesystem-backed resolver: videos live as `{id}.mp4` (or another
/// extension) under one upload directory, probed on resolution.
pub struct FsSourceResolver {
    upload_dir: PathBuf,
    extensions: Vec<&'static str>,
}

impl FsSourceResolver {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            extensions: vec!["mp4", "mov", "mkv", "webm"],
        }
    }

    fn candidate_paths(&self, video_id: &VideoId) -> impl Iterator<Item = PathBuf> + '_ {
        let stem = video_id.as_str().to_string();
        self.extensions
            .iter()
            .map(move |ext| self.upload_dir.join(format!("{stem}.{ext}")))
    }
}

#[async_trait]
impl SourceResolver for FsSourceResolver {
    async fn resolve(&self, video_id: &VideoId) -> EngineResult<SourceVideo> {
        for path in self.candidate_paths(video_id) {
            if !path.exists() {
                continue;
            }

            debug!(video_id = %video_id, path = %path.display(), "Probing source video");
            let info = probe_video(&path).await?;
            return Ok(SourceVideo::new(
                video_id.clone(),
                path,
                info.duration,
                info.format,
                info.size,
            ));
        }

        Err(EngineError::VideoNotFound(video_id.clone()))
    }
}

/// Fixed-map resolver for tests and the selfcheck binary.
#[derive(Default)]
pub struct StaticResolver {
    videos: HashMap<VideoId, SourceVideo>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, video: SourceVideo) -> Self {
        self.videos.insert(video.id.clone(), video);
        self
    }
}

#[async_trait]
impl SourceResolver for StaticResolver {
    async fn resolve(&self, video_id: &VideoId) -> EngineResult<SourceVideo> {
        let video = self
            .videos
            .get(video_id)
            .ok_or_else(|| EngineError::VideoNotFound(video_id.clone()))?;

        // The backing file may have vanished since registration
        if !video.path.exists() {
            return Err(EngineError::VideoNotFound(video_id.clone()));
        }

        Ok(video.clone())
    }
}
