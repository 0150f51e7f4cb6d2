//! Client configuration.

use std::time::Duration;

use storyreel_models::{IndexBase, KeyCodec};

/// Configuration for [`StudioClient`](crate::StudioClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin
    pub base_url: String,
    /// Default request timeout (generation calls can be slow)
    pub request_timeout: Duration,
    /// Budget for scene-scoped artifact fetches
    pub scene_fetch_timeout: Duration,
    /// Budget for video generation submissions
    pub video_submit_timeout: Duration,
    /// Build video lookup keys without the `+1` offset
    pub legacy_video_keys: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(300),
            scene_fetch_timeout: Duration::from_secs(30),
            video_submit_timeout: Duration::from_secs(60),
            legacy_video_keys: false,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("STORYREEL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout: secs_from_env("STORYREEL_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout),
            scene_fetch_timeout: secs_from_env("STORYREEL_SCENE_FETCH_TIMEOUT")
                .unwrap_or(defaults.scene_fetch_timeout),
            video_submit_timeout: secs_from_env("STORYREEL_VIDEO_SUBMIT_TIMEOUT")
                .unwrap_or(defaults.video_submit_timeout),
            legacy_video_keys: std::env::var("STORYREEL_LEGACY_VIDEO_KEYS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.legacy_video_keys),
        }
    }

    /// Point the client at another origin.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Key codec matching this configuration.
    pub fn key_codec(&self) -> KeyCodec {
        if self.legacy_video_keys {
            KeyCodec::new(IndexBase::ZeroBased)
        } else {
            KeyCodec::default()
        }
    }
}

fn secs_from_env(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.scene_fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.video_submit_timeout, Duration::from_secs(60));
        assert_eq!(config.key_codec(), KeyCodec::default());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ClientConfig::default().with_base_url("http://studio:9000/");
        assert_eq!(config.base_url, "http://studio:9000");
    }

    #[test]
    fn test_legacy_codec() {
        let config = ClientConfig {
            legacy_video_keys: true,
            ..Default::default()
        };
        assert_eq!(config.key_codec().video_lookup, IndexBase::ZeroBased);
    }
}
