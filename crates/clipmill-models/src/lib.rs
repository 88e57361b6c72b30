//! Shared data models for the Clipmill clip engine.
//!
//! This crate provides Serde-serializable types for:
//! - Source videos and their identifiers
//! - Clip records and their status lifecycle
//! - Batch aggregates derived from member clips
//! - Video styles and their duration policies
//! - Encoding configuration
//! - Output naming conventions

pub mod batch;
pub mod clip;
pub mod encoding;
pub mod naming;
pub mod style;
pub mod video;

// Re-export common types
pub use batch::{BatchStatus, ClipBatch};
pub use clip::{Clip, ClipId, ClipStatus};
pub use encoding::EncodingConfig;
pub use naming::{clip_filename, sanitize_file_stem, thumbnail_filename};
pub use style::{parse_styles, CaptionPosition, Style, StyleParseError};
pub use video::{SourceVideo, VideoId};
