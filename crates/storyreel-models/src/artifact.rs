//! Generated media and the classes they are cached under.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::key::ArtifactKey;

/// Artifact classes, one cache map each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactClass {
    Image,
    Narration,
    Music,
    Video,
}

impl ArtifactClass {
    pub const ALL: &'static [ArtifactClass] = &[
        ArtifactClass::Image,
        ArtifactClass::Narration,
        ArtifactClass::Music,
        ArtifactClass::Video,
    ];

    /// Path segment used by the `get-all-*` and `get-scene-*` endpoints.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ArtifactClass::Image => "images",
            ArtifactClass::Narration => "narrations",
            ArtifactClass::Music => "background-music",
            ArtifactClass::Video => "videos",
        }
    }

    /// Field of the response envelope carrying the map.
    pub fn map_field(&self) -> &'static str {
        match self {
            ArtifactClass::Image => "images",
            ArtifactClass::Narration => "narrations",
            ArtifactClass::Music => "background_music",
            ArtifactClass::Video => "videos",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactClass::Image => "image",
            ArtifactClass::Narration => "narration",
            ArtifactClass::Music => "music",
            ArtifactClass::Video => "video",
        }
    }
}

impl fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight set a generation request is tracked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightClass {
    Image,
    Music,
    ShotVideo,
    SceneVideo,
}

impl FlightClass {
    pub const ALL: &'static [FlightClass] = &[
        FlightClass::Image,
        FlightClass::Music,
        FlightClass::ShotVideo,
        FlightClass::SceneVideo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightClass::Image => "image",
            FlightClass::Music => "music",
            FlightClass::ShotVideo => "shot_video",
            FlightClass::SceneVideo => "scene_video",
        }
    }
}

impl fmt::Display for FlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated artifact: inline base64 media or an opaque URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Absolute `http(s)` URLs, and server-relative paths that cannot be
    /// base64. Inline JPEG payloads also start with `/` (`/9j/...`).
    pub fn is_url(&self) -> bool {
        let s = self.0.as_str();
        if s.starts_with("http://") || s.starts_with("https://") {
            return true;
        }
        s.starts_with('/')
            && !s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    }

    /// Decode an inline payload, accepting an optional `data:...;base64,` prefix.
    pub fn decode(&self) -> ModelResult<Vec<u8>> {
        if self.is_url() {
            return Err(ModelError::NotInline);
        }
        let payload = match self.0.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => self.0.as_str(),
        };
        Ok(STANDARD.decode(payload.trim())?)
    }

    /// URL with a `t=<stamp>` query parameter so HTTP caches are bypassed.
    /// Inline payloads are returned unchanged.
    pub fn cache_busted(&self, stamp: i64) -> String {
        if !self.is_url() {
            return self.0.clone();
        }
        let separator = if self.0.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", self.0, separator, stamp)
    }
}

impl From<String> for Artifact {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Artifacts of one class keyed by cache key.
pub type ArtifactMap = HashMap<ArtifactKey, Artifact>;
