//! FFmpeg filter construction per style.
//!
//! Every styled render reduces to one ffmpeg invocation; this module builds
//! the filter expressions. Output is always 1080x1920 portrait.

use clipmill_models::encoding::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use clipmill_models::CaptionPosition;

use crate::salience::Segment;

/// Base portrait conversion: fit the source into 1080x1920 with padding.
pub const FILTER_PORTRAIT_FIT: &str = concat!(
    "scale=1080:1920:force_original_aspect_ratio=decrease,",
    "pad=1080:1920:(ow-iw)/2:(oh-ih)/2"
);

/// Stacked split view, top region emphasized (full frame on top, center
/// crop below).
pub const FILTER_SPLIT_TOP: &str = concat!(
    "split=2[main][alt];",
    "[main]scale=1080:960:force_original_aspect_ratio=decrease,",
    "pad=1080:960:(ow-iw)/2:(oh-ih)/2[top];",
    "[alt]crop=iw/2:ih/2:iw/4:ih/4,scale=1080:960[bottom];",
    "[top][bottom]vstack=inputs=2"
);

/// Stacked split view, bottom region emphasized.
pub const FILTER_SPLIT_BOTTOM: &str = concat!(
    "split=2[main][alt];",
    "[alt]crop=iw/2:ih/2:iw/4:ih/4,scale=1080:960[top];",
    "[main]scale=1080:960:force_original_aspect_ratio=decrease,",
    "pad=1080:960:(ow-iw)/2:(oh-ih)/2[bottom];",
    "[top][bottom]vstack=inputs=2"
);

/// Escape a caption string for use inside drawtext.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace('%', "\\%")
}

/// Caption overlay: semi-opaque box plus centered text at the configured
/// screen position.
pub fn build_caption_filter(position: CaptionPosition, text: &str) -> String {
    let (box_y, text_y) = match position {
        CaptionPosition::Top => ("ih*0.08", "h*0.08+(h*0.14-text_h)/2"),
        CaptionPosition::Bottom => ("ih*0.78", "h*0.78+(h*0.14-text_h)/2"),
    };

    let mut filter = format!(
        "{FILTER_PORTRAIT_FIT},drawbox=x=0:y={box_y}:w=iw:h=ih*0.14:color=black@0.6:t=fill"
    );

    if !text.is_empty() {
        filter.push_str(&format!(
            ",drawtext=text='{}':fontsize=64:fontcolor=white:x=(w-text_w)/2:y={text_y}",
            escape_drawtext(text)
        ));
    }

    filter
}

/// Programmed zoom/pan path: slow push-in toward the frame center.
pub fn build_zoom_filter(duration_seconds: f64, fps: f64) -> String {
    let frames = (duration_seconds * fps).ceil().max(1.0) as u64;
    format!(
        "zoompan=z='min(zoom+0.0010,1.25)':d=1:\
         x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':\
         s={OUTPUT_WIDTH}x{OUTPUT_HEIGHT}:fps={fps},trim=end_frame={frames}"
    )
}

/// Decorative border: shrink the frame and pad it back out on a colored
/// matte.
pub fn build_border_filter() -> String {
    format!(
        "scale={inner_w}:{inner_h}:force_original_aspect_ratio=decrease,\
         pad={inner_w}:{inner_h}:(ow-iw)/2:(oh-ih)/2,\
         pad={OUTPUT_WIDTH}:{OUTPUT_HEIGHT}:(ow-iw)/2:(oh-ih)/2:color=white",
        inner_w = OUTPUT_WIDTH - 80,
        inner_h = OUTPUT_HEIGHT - 80,
    )
}

/// Motion resampling: retime video PTS and pitch-correct audio tempo.
///
/// Returns (video_filter, audio_filter). atempo only accepts factors in
/// [0.5, 2.0], so factors outside that range are chained.
pub fn build_speed_filters(speed_factor: f64) -> (String, String) {
    let video = format!("setpts=PTS/{speed_factor:.4},{FILTER_PORTRAIT_FIT}");

    let mut audio_stages = Vec::new();
    let mut remaining = speed_factor;
    while remaining > 2.0 {
        audio_stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        audio_stages.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    audio_stages.push(format!("atempo={remaining:.4}"));

    (video, audio_stages.join(","))
}

/// Highlight reel: trim each selected segment and concatenate.
pub fn build_highlight_filter(segments: &[Segment]) -> String {
    let mut parts = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        parts.push(format!(
            "[0:v]trim=start={start:.3}:end={end:.3},setpts=PTS-STARTPTS,{FILTER_PORTRAIT_FIT}[v{i}];\
             [0:a]atrim=start={start:.3}:end={end:.3},asetpts=PTS-STARTPTS[a{i}]",
            start = seg.start,
            end = seg.end(),
        ));
    }

    let inputs: String = (0..segments.len())
        .map(|i| format!("[v{i}][a{i}]"))
        .collect();

    format!(
        "{};{}concat=n={}:v=1:a=1[vout][aout]",
        parts.join(";"),
        inputs,
        segments.len()
    )
}

/// Dynamic captions: per-segment drawtext windows that alternate screen
/// position, enabled over consecutive time intervals.
pub fn build_dynamic_captions_filter(
    words: &[&str],
    duration_seconds: f64,
) -> String {
    if words.is_empty() {
        return FILTER_PORTRAIT_FIT.to_string();
    }

    let window = duration_seconds / words.len() as f64;
    let mut filter = FILTER_PORTRAIT_FIT.to_string();

    for (i, word) in words.iter().enumerate() {
        let start = window * i as f64;
        let end = start + window;
        // Alternate between lower-third and upper-third placements
        let y = if i % 2 == 0 { "h*0.80" } else { "h*0.12" };
        filter.push_str(&format!(
            ",drawtext=text='{}':fontsize=72:fontcolor=white:borderw=4:bordercolor=black:\
             x=(w-text_w)/2:y={y}:enable='between(t,{start:.3},{end:.3})'",
            escape_drawtext(word)
        ));
    }

    filter
}

/// Creative transitions: fade-out/fade-in pulses at each cut point.
///
/// Cut points default to the quarter marks of the clip; a real cut detector
/// can supply its own offsets.
pub fn build_transition_filter(cut_points: &[f64]) -> String {
    const FADE: f64 = 0.25;

    let mut filter = FILTER_PORTRAIT_FIT.to_string();
    for cut in cut_points {
        filter.push_str(&format!(
            ",fade=t=out:st={:.3}:d={FADE:.3},fade=t=in:st={:.3}:d={FADE:.3}",
            cut - FADE,
            *cut
        ));
    }
    filter
}

/// Default cut points for a clip of the given duration (quarter marks).
///
/// A fade pulse needs room on both sides, so cuts hugging either end of the
/// clip are dropped.
pub fn default_cut_points(duration_seconds: f64) -> Vec<f64> {
    [0.25, 0.5, 0.75]
        .iter()
        .map(|f| duration_seconds * f)
        .filter(|t| *t > 0.5 && *t < duration_seconds - 0.5)
        .collect()
}

/// Thumbnail scaling filter.
pub fn filter_thumbnail(width: u32) -> String {
    format!("scale={}:-2", width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_filter_positions() {
        let top = build_caption_filter(CaptionPosition::Top, "hello");
        let bottom = build_caption_filter(CaptionPosition::Bottom, "hello");
        assert!(top.contains("drawbox"));
        assert!(top.contains("drawtext"));
        assert_ne!(top, bottom);
    }

    #[test]
    fn test_caption_filter_empty_text_skips_drawtext() {
        let filter = build_caption_filter(CaptionPosition::Bottom, "");
        assert!(filter.contains("drawbox"));
        assert!(!filter.contains("drawtext"));
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("a:b'c"), "a\\:b\\'c");
    }

    #[test]
    fn test_split_filters_stack() {
        assert!(FILTER_SPLIT_TOP.contains("vstack"));
        assert!(FILTER_SPLIT_BOTTOM.contains("vstack"));
        assert_ne!(FILTER_SPLIT_TOP, FILTER_SPLIT_BOTTOM);
    }

    #[test]
    fn test_speed_filters_chain_atempo() {
        let (_, audio) = build_speed_filters(4.0);
        assert_eq!(audio, "atempo=2.0,atempo=2.0000");

        let (_, audio) = build_speed_filters(0.25);
        assert_eq!(audio, "atempo=0.5,atempo=0.5000");

        let (video, audio) = build_speed_filters(0.5);
        assert!(video.contains("setpts=PTS/0.5000"));
        assert_eq!(audio, "atempo=0.5000");
    }

    #[test]
    fn test_highlight_filter_concat_count() {
        let segments = vec![Segment::new(0.0, 4.0), Segment::new(10.0, 4.0)];
        let filter = build_highlight_filter(&segments);
        assert!(filter.contains("concat=n=2:v=1:a=1"));
        assert!(filter.contains("trim=start=10.000:end=14.000"));
    }

    #[test]
    fn test_dynamic_captions_enable_windows() {
        let filter = build_dynamic_captions_filter(&["one", "two"], 10.0);
        assert!(filter.contains("between(t,0.000,5.000)"));
        assert!(filter.contains("between(t,5.000,10.000)"));
    }

    #[test]
    fn test_default_cut_points_skip_near_start() {
        assert_eq!(default_cut_points(30.0), vec![7.5, 15.0, 22.5]);
        assert!(default_cut_points(1.0).is_empty());
    }

    #[test]
    fn test_zoom_filter_bounds_frames() {
        let filter = build_zoom_filter(10.0, 30.0);
        assert!(filter.contains("zoompan"));
        assert!(filter.contains("trim=end_frame=300"));
    }
}
