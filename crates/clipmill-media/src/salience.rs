//! Segment selection for highlight reels.
//!
//! The scoring heuristic is deliberately pluggable: what counts as a
//! "high-energy" segment depends on the content domain (gaming, podcasts,
//! sports) and on whatever signal source is available. The renderer only
//! depends on the [`SalienceScorer`] trait.

use clipmill_models::SourceVideo;

/// A selected sub-segment of the source video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// Segment length in seconds
    pub duration: f64,
}

impl Segment {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Selects the sub-segments a highlight reel is built from.
///
/// Implementations must return non-overlapping segments in ascending start
/// order whose total duration does not exceed `max_total_seconds`.
pub trait SalienceScorer: Send + Sync {
    fn select_segments(&self, source: &SourceVideo, max_total_seconds: f64) -> Vec<Segment>;
}

/// Stand-in scorer: evenly spread fixed-length windows across the source.
///
/// Carries no notion of salience; it exists so highlight reels have
/// deterministic, testable timing until a signal-driven scorer is plugged in.
#[derive(Debug, Clone)]
pub struct SpreadScorer {
    /// Length of each selected window in seconds
    pub window_seconds: f64,
    /// Maximum number of windows to select
    pub max_windows: usize,
}

impl Default for SpreadScorer {
    fn default() -> Self {
        Self {
            window_seconds: 4.0,
            max_windows: 5,
        }
    }
}

impl SalienceScorer for SpreadScorer {
    fn select_segments(&self, source: &SourceVideo, max_total_seconds: f64) -> Vec<Segment> {
        let source_len = source.duration_seconds;
        if source_len <= 0.0 {
            return Vec::new();
        }

        // Short sources pass through whole
        if source_len <= self.window_seconds {
            return vec![Segment::new(0.0, source_len.min(max_total_seconds))];
        }

        let budget = max_total_seconds.min(source_len);
        let count = self
            .max_windows
            .min((budget / self.window_seconds).floor() as usize)
            .max(1);

        // Center a window inside each of `count` equal slices of the source
        let slice = source_len / count as f64;
        (0..count)
            .map(|i| {
                let center = slice * (i as f64 + 0.5);
                let start = (center - self.window_seconds / 2.0).max(0.0);
                let duration = self.window_seconds.min(source_len - start);
                Segment::new(start, duration)
            })
            .collect()
    }
}

/// Total duration of a segment list.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmill_models::VideoId;

    fn source(duration: f64) -> SourceVideo {
        SourceVideo::new(VideoId::from("v"), "/tmp/v.mp4", duration, "mp4", 1024)
    }

    #[test]
    fn test_spread_scorer_respects_budget() {
        let scorer = SpreadScorer::default();
        let segments = scorer.select_segments(&source(60.0), 20.0);
        assert_eq!(segments.len(), 5);
        assert!(total_duration(&segments) <= 20.0 + f64::EPSILON);
    }

    #[test]
    fn test_segments_ordered_and_in_bounds() {
        let scorer = SpreadScorer::default();
        let segments = scorer.select_segments(&source(100.0), 30.0);
        let mut prev_end = 0.0;
        for seg in &segments {
            assert!(seg.start >= prev_end - f64::EPSILON, "segments overlap");
            assert!(seg.end() <= 100.0 + f64::EPSILON);
            prev_end = seg.end();
        }
    }

    #[test]
    fn test_short_source_passes_through() {
        let scorer = SpreadScorer::default();
        let segments = scorer.select_segments(&source(3.0), 20.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 0.0);
        assert!((segments[0].duration - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_source() {
        let scorer = SpreadScorer::default();
        assert!(scorer.select_segments(&source(0.0), 20.0).is_empty());
    }
}
