//! Output naming and path policy.

use crate::{Style, VideoId};

/// Sanitize a string for use as a filename stem.
///
/// Only allows ASCII alphanumeric, hyphen, and underscore. Non-ASCII
/// characters are stripped to prevent URL encoding mismatches between the
/// object store and signed URLs.
pub fn sanitize_file_stem(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase()
        .chars()
        .take(64)
        .collect()
}

/// Output filename for a clip.
///
/// Format: `clip_{video_id}_{style}.mp4`
pub fn clip_filename(video_id: &VideoId, style: Style) -> String {
    format!(
        "clip_{}_{}.mp4",
        sanitize_file_stem(video_id.as_str()),
        style.as_filename_part()
    )
}

/// Thumbnail filename for a clip, alongside the output media.
pub fn thumbnail_filename(video_id: &VideoId, style: Style) -> String {
    format!(
        "clip_{}_{}.jpg",
        sanitize_file_stem(video_id.as_str()),
        style.as_filename_part()
    )
}
