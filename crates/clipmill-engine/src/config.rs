//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum renders in flight at once across all batches
    pub max_concurrent_renders: usize,
    /// Per-render timeout; a renderer stuck past this fails its clip
    pub render_timeout: Duration,
    /// Root directory for rendered output (one subdirectory per video)
    pub output_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_renders: 4,
            render_timeout: Duration::from_secs(600),
            output_root: PathBuf::from("/tmp/clipmill"),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_renders: std::env::var("CLIPMILL_MAX_CONCURRENT_RENDERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            render_timeout: Duration::from_secs(
                std::env::var("CLIPMILL_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            output_root: std::env::var("CLIPMILL_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/clipmill")),
        }
    }

    /// Returns a config with the given output root.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Returns a config with the given concurrency bound.
    pub fn with_max_concurrent_renders(mut self, n: usize) -> Self {
        self.max_concurrent_renders = n.max(1);
        self
    }
}
