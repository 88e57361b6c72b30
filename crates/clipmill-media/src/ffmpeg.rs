//! FFmpeg-backed style renderer.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clipmill_models::{EncodingConfig, Style};
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters;
use crate::renderer::{RenderRequest, RenderedClip, StyleRenderer};
use crate::salience::{total_duration, SalienceScorer, SpreadScorer};
use crate::thumbnail::generate_thumbnail;

/// Default per-render timeout in seconds.
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 600;

/// Zoompan works on a fixed output rate; the styles that retime frames all
/// render at this rate.
const ZOOM_OUTPUT_FPS: f64 = 30.0;

/// Maximum total seconds a highlight reel may select.
const HIGHLIGHT_BUDGET_SECS: f64 = 20.0;

/// The shipped [`StyleRenderer`]: drives the `ffmpeg` CLI, one invocation
/// per render.
pub struct FfmpegRenderer {
    runner: FfmpegRunner,
    scorer: Arc<dyn SalienceScorer>,
}

impl FfmpegRenderer {
    /// Create a renderer, verifying ffmpeg is on PATH.
    pub fn new() -> MediaResult<Self> {
        check_ffmpeg()?;
        Ok(Self {
            runner: FfmpegRunner::new().with_timeout(DEFAULT_RENDER_TIMEOUT_SECS),
            scorer: Arc::new(SpreadScorer::default()),
        })
    }

    /// Override the per-render timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = FfmpegRunner::new().with_timeout(secs);
        self
    }

    /// Substitute the highlight-reel segment scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn SalienceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Build the ffmpeg command for a request, returning the command and the
    /// expected output duration.
    fn build_command(&self, request: &RenderRequest) -> MediaResult<(FfmpegCommand, f64)> {
        let source = &request.source;
        let source_secs = source.duration_seconds;
        let caption = request.caption_text.as_deref().unwrap_or("");

        let mut cmd = FfmpegCommand::new(&source.path, &request.output_path);
        let mut duration = request.style.expected_duration(source_secs);

        match request.style {
            Style::CaptionTop | Style::CaptionBottom => {
                // caption_position is Some for exactly these variants
                let position = request
                    .style
                    .caption_position()
                    .ok_or_else(|| MediaError::invalid_video("caption style without position"))?;
                cmd = cmd.video_filter(filters::build_caption_filter(position, caption));
            }
            Style::SplitTop => {
                cmd = cmd.video_filter(filters::FILTER_SPLIT_TOP);
            }
            Style::SplitBottom => {
                cmd = cmd.video_filter(filters::FILTER_SPLIT_BOTTOM);
            }
            Style::ZoomFocus => {
                cmd = cmd.video_filter(filters::build_zoom_filter(source_secs, ZOOM_OUTPUT_FPS));
            }
            Style::BorderEffect => {
                cmd = cmd.video_filter(filters::build_border_filter());
            }
            Style::SlowMotion | Style::FastMotion => {
                // speed_factor is Some for exactly these variants
                let factor = request
                    .style
                    .speed_factor()
                    .ok_or_else(|| MediaError::invalid_video("motion style without factor"))?;
                let (video, audio) = filters::build_speed_filters(factor);
                cmd = cmd.video_filter(video).audio_filter(audio);
            }
            Style::HighlightReel => {
                let segments = self.scorer.select_segments(source, HIGHLIGHT_BUDGET_SECS);
                if segments.is_empty() {
                    return Err(MediaError::invalid_video(
                        "no segments selected for highlight reel",
                    ));
                }
                duration = total_duration(&segments);
                cmd = cmd
                    .filter_complex(filters::build_highlight_filter(&segments))
                    .output_args(["-map", "[vout]", "-map", "[aout]"]);
            }
            Style::DynamicCaptions => {
                let words: Vec<&str> = caption.split_whitespace().collect();
                cmd = cmd.video_filter(filters::build_dynamic_captions_filter(
                    &words,
                    source_secs,
                ));
            }
            Style::CreativeTransition => {
                let cuts = filters::default_cut_points(source_secs);
                cmd = cmd.video_filter(filters::build_transition_filter(&cuts));
            }
        }

        cmd = cmd.output_args(EncodingConfig::for_style(request.style).to_ffmpeg_args());

        Ok((cmd, duration))
    }
}

#[async_trait]
impl StyleRenderer for FfmpegRenderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedClip> {
        let style = request.style;
        let started = Instant::now();

        debug!(
            video_id = %request.source.id,
            style = %style,
            output = %request.output_path.display(),
            "Building render command"
        );

        let (cmd, duration_seconds) = self.build_command(request)?;

        let run_result = self.runner.run(&cmd).await;
        let processing_ms = started.elapsed().as_millis() as u64;

        if let Err(e) = run_result {
            counter!("clipmill_render_failed", "style" => style.as_filename_part()).increment(1);
            return Err(e);
        }

        // Thumbnail failure is non-fatal: the clip stays completed, the
        // preview is simply absent.
        let thumbnail_path = request.thumbnail_path();
        let thumbnail_path = match generate_thumbnail(&request.output_path, &thumbnail_path).await
        {
            Ok(()) => Some(thumbnail_path),
            Err(e) => {
                warn!(
                    video_id = %request.source.id,
                    style = %style,
                    error = %e,
                    "Thumbnail extraction failed"
                );
                None
            }
        };

        counter!("clipmill_render_completed", "style" => style.as_filename_part()).increment(1);
        histogram!("clipmill_render_duration_ms", "style" => style.as_filename_part())
            .record(processing_ms as f64);

        info!(
            video_id = %request.source.id,
            style = %style,
            duration_seconds = duration_seconds,
            processing_ms = processing_ms,
            "Render completed"
        );

        Ok(RenderedClip {
            output_path: request.output_path.clone(),
            thumbnail_path,
            duration_seconds,
            processing_ms,
        })
    }
}
