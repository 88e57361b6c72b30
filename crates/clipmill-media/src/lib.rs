//! FFmpeg CLI wrapper and style renderers for Clipmill.
//!
//! The crate's seam is the [`StyleRenderer`] trait: one call transforms one
//! source video into one styled output plus thumbnail. [`FfmpegRenderer`] is
//! the shipped backend; orchestration code and tests can substitute any other
//! implementation.

pub mod command;
pub mod error;
pub mod ffmpeg;
pub mod filters;
pub mod probe;
pub mod renderer;
pub mod salience;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::FfmpegRenderer;
pub use probe::{probe_video, VideoInfo};
pub use renderer::{RenderRequest, RenderedClip, StyleRenderer};
pub use salience::{SalienceScorer, Segment, SpreadScorer};
pub use thumbnail::generate_thumbnail;
