//! Thumbnail generation.

use std::path::Path;

use clipmill_models::encoding::{THUMBNAIL_SCALE_WIDTH, THUMBNAIL_TIMESTAMP};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::filter_thumbnail;

/// Extract a representative still frame from a rendered output.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video_path.as_ref(), output_path.as_ref())
        .input_arg("-ss")
        .input_arg(THUMBNAIL_TIMESTAMP)
        .single_frame()
        .video_filter(filter_thumbnail(THUMBNAIL_SCALE_WIDTH))
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}
