//! Generatable artifact slots.
//!
//! Opening/closing images, music and videos all share one
//! generate/cache/in-flight flow; a [`SlotKind`] supplies the parts that
//! differ.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactClass, FlightClass};
use crate::error::ModelError;
use crate::key::{ArtifactKey, Frame, KeyCodec, SceneRef, ShotRef};
use crate::script::Script;

/// Kind of a generatable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    OpeningImage,
    ClosingImage,
    Music,
    ShotVideo,
    SceneVideo,
}

/// Whether a slot lives on a shot or on a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope {
    Shot,
    Scene,
}

impl SlotKind {
    pub const ALL: &'static [SlotKind] = &[
        SlotKind::OpeningImage,
        SlotKind::ClosingImage,
        SlotKind::Music,
        SlotKind::ShotVideo,
        SlotKind::SceneVideo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::OpeningImage => "opening_image",
            SlotKind::ClosingImage => "closing_image",
            SlotKind::Music => "music",
            SlotKind::ShotVideo => "shot_video",
            SlotKind::SceneVideo => "scene_video",
        }
    }

    /// Cache map the artifact lands in.
    pub fn artifact_class(&self) -> ArtifactClass {
        match self {
            SlotKind::OpeningImage | SlotKind::ClosingImage => ArtifactClass::Image,
            SlotKind::Music => ArtifactClass::Music,
            SlotKind::ShotVideo | SlotKind::SceneVideo => ArtifactClass::Video,
        }
    }

    pub fn flight_class(&self) -> FlightClass {
        match self {
            SlotKind::OpeningImage | SlotKind::ClosingImage => FlightClass::Image,
            SlotKind::Music => FlightClass::Music,
            SlotKind::ShotVideo => FlightClass::ShotVideo,
            SlotKind::SceneVideo => FlightClass::SceneVideo,
        }
    }

    pub fn scope(&self) -> SlotScope {
        match self {
            SlotKind::OpeningImage | SlotKind::ClosingImage | SlotKind::ShotVideo => {
                SlotScope::Shot
            }
            SlotKind::Music | SlotKind::SceneVideo => SlotScope::Scene,
        }
    }

    pub fn frame(&self) -> Option<Frame> {
        match self {
            SlotKind::OpeningImage => Some(Frame::Opening),
            SlotKind::ClosingImage => Some(Frame::Closing),
            _ => None,
        }
    }

    /// Human readable plural, used in batch notices.
    pub fn plural_label(&self) -> &'static str {
        match self {
            SlotKind::OpeningImage => "opening images",
            SlotKind::ClosingImage => "closing images",
            SlotKind::Music => "background music tracks",
            SlotKind::ShotVideo => "shot videos",
            SlotKind::SceneVideo => "scene videos",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "opening_image" | "opening" => Ok(SlotKind::OpeningImage),
            "closing_image" | "closing" => Ok(SlotKind::ClosingImage),
            "music" | "background_music" => Ok(SlotKind::Music),
            "shot_video" => Ok(SlotKind::ShotVideo),
            "scene_video" => Ok(SlotKind::SceneVideo),
            _ => Err(ModelError::UnknownSlotKind(s.to_string())),
        }
    }
}

/// Where a slot lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotAddress {
    Shot(ShotRef),
    Scene(SceneRef),
}

impl SlotAddress {
    pub fn scene_ref(&self) -> SceneRef {
        match self {
            SlotAddress::Shot(shot) => shot.scene_ref(),
            SlotAddress::Scene(scene) => *scene,
        }
    }

    pub fn shot_ref(&self) -> Option<ShotRef> {
        match self {
            SlotAddress::Shot(shot) => Some(*shot),
            SlotAddress::Scene(_) => None,
        }
    }
}

/// One generatable artifact: a kind at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub kind: SlotKind,
    pub address: SlotAddress,
}

impl Slot {
    pub fn opening_image(shot: ShotRef) -> Self {
        Self::at_shot(SlotKind::OpeningImage, shot)
    }

    pub fn closing_image(shot: ShotRef) -> Self {
        Self::at_shot(SlotKind::ClosingImage, shot)
    }

    pub fn image(shot: ShotRef, frame: Frame) -> Self {
        match frame {
            Frame::Opening => Self::opening_image(shot),
            Frame::Closing => Self::closing_image(shot),
        }
    }

    pub fn music(scene: SceneRef) -> Self {
        Self::at_scene(SlotKind::Music, scene)
    }

    pub fn shot_video(shot: ShotRef) -> Self {
        Self::at_shot(SlotKind::ShotVideo, shot)
    }

    pub fn scene_video(scene: SceneRef) -> Self {
        Self::at_scene(SlotKind::SceneVideo, scene)
    }

    fn at_shot(kind: SlotKind, shot: ShotRef) -> Self {
        Self {
            kind,
            address: SlotAddress::Shot(shot),
        }
    }

    fn at_scene(kind: SlotKind, scene: SceneRef) -> Self {
        Self {
            kind,
            address: SlotAddress::Scene(scene),
        }
    }

    /// Build a slot of `kind` from a scene and an optional shot index.
    /// Returns `None` when a shot-scoped kind is given no shot.
    pub fn new(kind: SlotKind, scene: SceneRef, shot: Option<usize>) -> Option<Self> {
        match kind.scope() {
            SlotScope::Shot => shot.map(|sh| Self::at_shot(kind, scene.shot(sh))),
            SlotScope::Scene => Some(Self::at_scene(kind, scene)),
        }
    }

    pub fn scene_ref(&self) -> SceneRef {
        self.address.scene_ref()
    }

    /// Cache key of this slot.
    pub fn key(&self, codec: &KeyCodec) -> ArtifactKey {
        match (self.kind, self.address) {
            (SlotKind::OpeningImage, SlotAddress::Shot(shot)) => {
                codec.image_key(shot, Frame::Opening)
            }
            (SlotKind::ClosingImage, SlotAddress::Shot(shot)) => {
                codec.image_key(shot, Frame::Closing)
            }
            (SlotKind::ShotVideo, SlotAddress::Shot(shot)) => codec.shot_video_key(shot),
            (SlotKind::SceneVideo, address) => codec.scene_video_key(address.scene_ref()),
            (_, address) => codec.scene_key(address.scene_ref()),
        }
    }

    /// Prompt the slot is generated from, or `None` when the address is not
    /// in the script.
    pub fn source_prompt<'a>(&self, script: &'a Script) -> Option<&'a str> {
        match (self.kind, self.address) {
            (SlotKind::OpeningImage | SlotKind::ShotVideo, SlotAddress::Shot(at)) => script
                .shot(at)
                .map(|shot| shot.detailed_opening_scene_description.as_str()),
            (SlotKind::ClosingImage, SlotAddress::Shot(at)) => script
                .shot(at)
                .map(|shot| shot.detailed_closing_scene_description.as_str()),
            (SlotKind::Music, address) => script
                .scene(address.scene_ref())
                .map(|scene| scene.music_prompt()),
            (SlotKind::SceneVideo, address) => {
                script.scene(address.scene_ref()).map(|scene| {
                    if scene.shots.is_empty() {
                        ""
                    } else {
                        scene.general_scene_description_and_motivations.as_str()
                    }
                })
            }
            _ => None,
        }
    }

    /// Whether the script has a non-empty prompt for this slot.
    pub fn has_prompt(&self, script: &Script) -> bool {
        self.source_prompt(script)
            .map(|prompt| !prompt.trim().is_empty())
            .unwrap_or(false)
    }

    /// Every slot of `kind` in document order, regardless of prompt.
    pub fn all_of(kind: SlotKind, script: &Script) -> Vec<Slot> {
        match kind.scope() {
            SlotScope::Shot => script
                .shot_refs()
                .map(|shot| Self::at_shot(kind, shot))
                .collect(),
            SlotScope::Scene => script
                .scene_refs()
                .map(|scene| Self::at_scene(kind, scene))
                .collect(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            SlotAddress::Shot(shot) => write!(f, "{} at {}", self.kind, shot),
            SlotAddress::Scene(scene) => write!(f, "{} at {}", self.kind, scene),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Chapter, Scene, Shot};

    fn script() -> Script {
        let shot = |open: &str, close: &str| Shot {
            detailed_opening_scene_description: open.to_string(),
            detailed_closing_scene_description: close.to_string(),
            ..Default::default()
        };
        Script {
            chapters: vec![Chapter {
                chapter_number: 1,
                scenes: vec![
                    Scene {
                        general_scene_description_and_motivations: "harbour".to_string(),
                        shots: vec![shot("a red door", ""), shot("", "dusk")],
                        ..Default::default()
                    },
                    Scene {
                        general_scene_description_and_motivations: "empty".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_slot_keys_follow_codec() {
        let codec = KeyCodec::default();
        let shot = ShotRef::new(0, 0, 1);
        assert_eq!(Slot::opening_image(shot).key(&codec).as_str(), "1-1-2-opening");
        assert_eq!(Slot::closing_image(shot).key(&codec).as_str(), "1-1-2-closing");
        assert_eq!(Slot::shot_video(shot).key(&codec).as_str(), "1-1-2");
        assert_eq!(Slot::music(shot.scene_ref()).key(&codec).as_str(), "1-1");
        assert_eq!(Slot::scene_video(shot.scene_ref()).key(&codec).as_str(), "1-1");
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(SlotKind::ClosingImage.artifact_class(), ArtifactClass::Image);
        assert_eq!(SlotKind::ShotVideo.flight_class(), FlightClass::ShotVideo);
        assert_eq!(SlotKind::SceneVideo.artifact_class(), ArtifactClass::Video);
        assert_eq!(SlotKind::Music.scope(), SlotScope::Scene);
        assert_eq!("closing-image".parse::<SlotKind>().unwrap(), SlotKind::ClosingImage);
    }

    #[test]
    fn test_prompt_presence_filter() {
        let script = script();
        let prompted: Vec<_> = Slot::all_of(SlotKind::OpeningImage, &script)
            .into_iter()
            .filter(|slot| slot.has_prompt(&script))
            .collect();
        assert_eq!(prompted, vec![Slot::opening_image(ShotRef::new(0, 0, 0))]);

        let closing: Vec<_> = Slot::all_of(SlotKind::ClosingImage, &script)
            .into_iter()
            .filter(|slot| slot.has_prompt(&script))
            .collect();
        assert_eq!(closing, vec![Slot::closing_image(ShotRef::new(0, 0, 1))]);

        // A scene with no shots has nothing to assemble into a video.
        let videos: Vec<_> = Slot::all_of(SlotKind::SceneVideo, &script)
            .into_iter()
            .filter(|slot| slot.has_prompt(&script))
            .collect();
        assert_eq!(videos, vec![Slot::scene_video(SceneRef::new(0, 0))]);
    }

    #[test]
    fn test_missing_address_has_no_prompt() {
        let script = script();
        assert!(!Slot::opening_image(ShotRef::new(5, 0, 0)).has_prompt(&script));
        assert!(Slot::new(SlotKind::ShotVideo, SceneRef::new(0, 0), None).is_none());
    }
}
