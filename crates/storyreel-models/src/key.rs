//! Addresses, the 0-based/1-based index codec and artifact cache keys.
//!
//! Arrays in a [`Script`](crate::Script) are 0-based; everything the backend
//! sees (request bodies, URL segments, cache keys) is 1-based. The only place
//! that arithmetic happens is [`wire_index`] and [`from_wire_index`].

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Convert an in-memory index to its 1-based wire form.
pub fn wire_index(index: usize) -> u32 {
    u32::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(1))
        .unwrap_or(u32::MAX)
}

/// Convert a 1-based wire index back to an in-memory index.
pub fn from_wire_index(number: u32) -> Option<usize> {
    number.checked_sub(1).map(|i| i as usize)
}

/// Which numbering a key is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[default]
    OneBased,
    ZeroBased,
}

impl IndexBase {
    fn encode(&self, index: usize) -> u64 {
        match self {
            IndexBase::OneBased => wire_index(index) as u64,
            IndexBase::ZeroBased => index as u64,
        }
    }
}

/// A scene address (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneRef {
    pub chapter: usize,
    pub scene: usize,
}

impl SceneRef {
    pub fn new(chapter: usize, scene: usize) -> Self {
        Self { chapter, scene }
    }

    /// Address a shot inside this scene.
    pub fn shot(&self, shot: usize) -> ShotRef {
        ShotRef {
            chapter: self.chapter,
            scene: self.scene,
            shot,
        }
    }

    pub fn chapter_number(&self) -> u32 {
        wire_index(self.chapter)
    }

    pub fn scene_number(&self) -> u32 {
        wire_index(self.scene)
    }
}

impl fmt::Display for SceneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chapter {} scene {}",
            self.chapter_number(),
            self.scene_number()
        )
    }
}

/// A shot address (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShotRef {
    pub chapter: usize,
    pub scene: usize,
    pub shot: usize,
}

impl ShotRef {
    pub fn new(chapter: usize, scene: usize, shot: usize) -> Self {
        Self {
            chapter,
            scene,
            shot,
        }
    }

    pub fn scene_ref(&self) -> SceneRef {
        SceneRef::new(self.chapter, self.scene)
    }

    pub fn shot_number(&self) -> u32 {
        wire_index(self.shot)
    }
}

impl fmt::Display for ShotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shot {}", self.scene_ref(), self.shot_number())
    }
}

/// Which end of a shot an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    Opening,
    Closing,
}

impl Frame {
    pub const ALL: &'static [Frame] = &[Frame::Opening, Frame::Closing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frame::Opening => "opening",
            Frame::Closing => "closing",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frame {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opening" => Ok(Frame::Opening),
            "closing" => Ok(Frame::Closing),
            _ => Err(ModelError::UnknownFrame(s.to_string())),
        }
    }
}

/// Cache key of one artifact, e.g. `"1-2-3-opening"` or `"1-2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Image key: `"<c+1>-<s+1>-<sh+1>-<frame>"`.
    pub fn image(shot: ShotRef, frame: Frame) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            wire_index(shot.chapter),
            wire_index(shot.scene),
            wire_index(shot.shot),
            frame
        ))
    }

    /// Scene-level key for narration, music and scene video: `"<c+1>-<s+1>"`.
    pub fn scene(scene: SceneRef) -> Self {
        KeyCodec::default().scene_key(scene)
    }

    /// Shot video key: `"<c+1>-<s+1>-<sh+1>"`.
    pub fn shot(shot: ShotRef) -> Self {
        KeyCodec::default().shot_video_key(shot)
    }

    /// Wrap a key received from the backend verbatim.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a key back into its 1-based numbers and optional frame.
    pub fn parse(&self) -> ModelResult<KeyParts> {
        let segments: Vec<&str> = self.0.split('-').collect();
        let number = |s: &str| -> ModelResult<u32> {
            s.parse::<u32>()
                .map_err(|_| ModelError::invalid_key(self.0.clone()))
        };

        match segments.as_slice() {
            [c, s] => Ok(KeyParts {
                chapter: number(c)?,
                scene: number(s)?,
                shot: None,
                frame: None,
            }),
            [c, s, sh] => Ok(KeyParts {
                chapter: number(c)?,
                scene: number(s)?,
                shot: Some(number(sh)?),
                frame: None,
            }),
            [c, s, sh, frame] => Ok(KeyParts {
                chapter: number(c)?,
                scene: number(s)?,
                shot: Some(number(sh)?),
                frame: Some(frame.parse()?),
            }),
            _ => Err(ModelError::invalid_key(self.0.clone())),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactKey {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

/// Numbers carried by a key, as written (no base conversion applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts {
    pub chapter: u32,
    pub scene: u32,
    pub shot: Option<u32>,
    pub frame: Option<Frame>,
}

/// Builds scene and video keys.
///
/// Video lookups can be switched to 0-based numbering to reproduce the
/// legacy lookup path that skipped the `+1`; everything else is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCodec {
    pub video_lookup: IndexBase,
}

impl KeyCodec {
    pub fn new(video_lookup: IndexBase) -> Self {
        Self { video_lookup }
    }

    pub fn image_key(&self, shot: ShotRef, frame: Frame) -> ArtifactKey {
        ArtifactKey::image(shot, frame)
    }

    pub fn scene_key(&self, scene: SceneRef) -> ArtifactKey {
        ArtifactKey(format!(
            "{}-{}",
            wire_index(scene.chapter),
            wire_index(scene.scene)
        ))
    }

    pub fn shot_video_key(&self, shot: ShotRef) -> ArtifactKey {
        let base = self.video_lookup;
        ArtifactKey(format!(
            "{}-{}-{}",
            base.encode(shot.chapter),
            base.encode(shot.scene),
            wire_index(shot.shot)
        ))
    }

    pub fn scene_video_key(&self, scene: SceneRef) -> ArtifactKey {
        let base = self.video_lookup;
        ArtifactKey(format!(
            "{}-{}",
            base.encode(scene.chapter),
            base.encode(scene.scene)
        ))
    }
}
