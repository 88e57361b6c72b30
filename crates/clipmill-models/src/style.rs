//! Video style definitions and per-style duration policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Speed factor applied by the slow-motion style.
pub const SLOW_MOTION_FACTOR: f64 = 0.5;

/// Speed factor applied by the fast-motion style.
pub const FAST_MOTION_FACTOR: f64 = 2.0;

/// Available clip styles.
///
/// Every style maps one source video to one output rendition. Most styles
/// preserve the source duration; the motion styles scale it by their speed
/// factor and highlight reels trim it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// Caption box burned into the top third of the frame
    CaptionTop,
    /// Caption box burned into the bottom third of the frame
    CaptionBottom,
    /// Stacked split view with the top region emphasized
    SplitTop,
    /// Stacked split view with the bottom region emphasized
    SplitBottom,
    /// Programmed zoom/pan path across the frame
    ZoomFocus,
    /// Decorative border drawn around the frame
    BorderEffect,
    /// Playback resampled to half speed
    SlowMotion,
    /// Playback resampled to double speed
    FastMotion,
    /// Highest-salience sub-segments concatenated
    HighlightReel,
    /// Time-synced caption track with per-segment animation
    DynamicCaptions,
    /// Transition effect applied at detected cut points
    CreativeTransition,
}

/// Screen position for caption-overlay styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    Bottom,
}

impl Style {
    /// All available styles.
    pub const ALL: &'static [Style] = &[
        Style::CaptionTop,
        Style::CaptionBottom,
        Style::SplitTop,
        Style::SplitBottom,
        Style::ZoomFocus,
        Style::BorderEffect,
        Style::SlowMotion,
        Style::FastMotion,
        Style::HighlightReel,
        Style::DynamicCaptions,
        Style::CreativeTransition,
    ];

    /// Returns the style name as used in filenames and wire formats.
    pub fn as_filename_part(&self) -> &'static str {
        match self {
            Style::CaptionTop => "caption_top",
            Style::CaptionBottom => "caption_bottom",
            Style::SplitTop => "split_top",
            Style::SplitBottom => "split_bottom",
            Style::ZoomFocus => "zoom_focus",
            Style::BorderEffect => "border_effect",
            Style::SlowMotion => "slow_motion",
            Style::FastMotion => "fast_motion",
            Style::HighlightReel => "highlight_reel",
            Style::DynamicCaptions => "dynamic_captions",
            Style::CreativeTransition => "creative_transition",
        }
    }

    /// Playback speed multiplier, if this style resamples playback.
    pub fn speed_factor(&self) -> Option<f64> {
        match self {
            Style::SlowMotion => Some(SLOW_MOTION_FACTOR),
            Style::FastMotion => Some(FAST_MOTION_FACTOR),
            _ => None,
        }
    }

    /// Expected output duration for a source of the given length.
    ///
    /// Motion styles scale by their speed factor. Highlight reels select
    /// sub-segments, so their actual duration is whatever the scorer picked
    /// (bounded above by the source); this returns the bound.
    pub fn expected_duration(&self, source_seconds: f64) -> f64 {
        match self.speed_factor() {
            Some(factor) => source_seconds / factor,
            None => source_seconds,
        }
    }

    /// Caption screen position for the caption-overlay styles.
    pub fn caption_position(&self) -> Option<CaptionPosition> {
        match self {
            Style::CaptionTop => Some(CaptionPosition::Top),
            Style::CaptionBottom => Some(CaptionPosition::Bottom),
            _ => None,
        }
    }

    /// Whether this style composites the source into stacked screen regions.
    pub fn is_stacked(&self) -> bool {
        matches!(self, Style::SplitTop | Style::SplitBottom)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_filename_part())
    }
}

impl FromStr for Style {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "caption_top" => Ok(Style::CaptionTop),
            "caption_bottom" => Ok(Style::CaptionBottom),
            "split_top" => Ok(Style::SplitTop),
            "split_bottom" => Ok(Style::SplitBottom),
            "zoom_focus" => Ok(Style::ZoomFocus),
            "border_effect" => Ok(Style::BorderEffect),
            "slow_motion" => Ok(Style::SlowMotion),
            "fast_motion" => Ok(Style::FastMotion),
            "highlight_reel" => Ok(Style::HighlightReel),
            "dynamic_captions" => Ok(Style::DynamicCaptions),
            "creative_transition" => Ok(Style::CreativeTransition),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown style: {0}")]
pub struct StyleParseError(pub String);

/// Parse a caller-supplied list of style names into a deduplicated style list.
///
/// Handles the "all" keyword and is case-insensitive. Unlike lenient
/// expansion, an unknown name rejects the whole list: a batch request with a
/// misspelled style must fail before any clip record is created.
pub fn parse_styles(names: &[String]) -> Result<Vec<Style>, StyleParseError> {
    let mut result = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for name in names {
        let lower = name.to_lowercase();
        if lower == "all" {
            for style in Style::ALL {
                if seen.insert(*style) {
                    result.push(*style);
                }
            }
        } else {
            let style = lower.parse::<Style>()?;
            if seen.insert(style) {
                result.push(style);
            }
        }
    }

    Ok(result)
}
