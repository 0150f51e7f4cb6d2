//! Studio configuration.

use std::time::Duration;

/// Timing knobs of the studio.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Pause between consecutive items of a batch
    pub batch_delay: Duration,
    /// Delay before a followed selection is scrolled into view
    pub selection_settle: Duration,
    /// Music style used when the request sets none
    pub default_music_style: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_secs(1),
            selection_settle: Duration::from_millis(100),
            default_music_style: "cinematic".to_string(),
        }
    }
}

impl StudioConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_delay: millis_from_env("STORYREEL_BATCH_DELAY_MS").unwrap_or(defaults.batch_delay),
            selection_settle: millis_from_env("STORYREEL_SELECTION_SETTLE_MS")
                .unwrap_or(defaults.selection_settle),
            default_music_style: std::env::var("STORYREEL_MUSIC_STYLE")
                .unwrap_or(defaults.default_music_style),
        }
    }
}

fn millis_from_env(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}
