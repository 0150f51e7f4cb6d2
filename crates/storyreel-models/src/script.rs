//! Script document: chapters, scenes and shots.
//!
//! Field names match the backend's JSON. Fields this client does not model
//! are kept in `extra` so a whole-document PUT sends them back untouched.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::key::{SceneRef, ShotRef};

/// Root aggregate of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    pub chapters: Vec<Chapter>,

    /// Visual style applied to generated media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Render everything in black and white
    #[serde(default)]
    pub black_and_white: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chapter (numbered from 1 by the backend).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    #[serde(default)]
    pub chapter_number: u32,

    #[serde(default)]
    pub chapter_title: String,

    #[serde(default)]
    pub chapter_description: String,

    #[serde(default)]
    pub key_events: Vec<String>,

    #[serde(default)]
    pub main_characters: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub scenes: Vec<Scene>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scene within a chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    #[serde(default)]
    pub scene_number: i64,

    /// Main story text
    #[serde(default)]
    pub general_scene_description_and_motivations: String,

    #[serde(default)]
    pub narration_text: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub shots: Vec<Shot>,

    /// Background music descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    /// Prompt used when generating background music.
    pub fn music_prompt(&self) -> &str {
        match self.background_music.as_deref() {
            Some(music) if !music.trim().is_empty() => music,
            _ => &self.general_scene_description_and_motivations,
        }
    }
}

/// A shot, the unit of artifact generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    #[serde(default)]
    pub shot_number: i64,

    /// Opening frame prompt
    #[serde(default)]
    pub detailed_opening_scene_description: String,

    /// Closing frame prompt
    #[serde(default)]
    pub detailed_closing_scene_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director_instructions: Option<String>,

    /// Read-only rationale written by the generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Script {
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_mut(&mut self, index: usize) -> Option<&mut Chapter> {
        self.chapters.get_mut(index)
    }

    pub fn scene(&self, at: SceneRef) -> Option<&Scene> {
        self.chapter(at.chapter)?.scenes.get(at.scene)
    }

    pub fn scene_mut(&mut self, at: SceneRef) -> Option<&mut Scene> {
        self.chapter_mut(at.chapter)?.scenes.get_mut(at.scene)
    }

    pub fn shot(&self, at: ShotRef) -> Option<&Shot> {
        self.scene(at.scene_ref())?.shots.get(at.shot)
    }

    pub fn shot_mut(&mut self, at: ShotRef) -> Option<&mut Shot> {
        self.scene_mut(at.scene_ref())?.shots.get_mut(at.shot)
    }

    /// Every scene address, in document order.
    pub fn scene_refs(&self) -> impl Iterator<Item = SceneRef> + '_ {
        self.chapters.iter().enumerate().flat_map(|(c, chapter)| {
            (0..chapter.scenes.len()).map(move |s| SceneRef::new(c, s))
        })
    }

    /// Every shot address, in document order.
    pub fn shot_refs(&self) -> impl Iterator<Item = ShotRef> + '_ {
        self.scene_refs().flat_map(move |at| {
            let count = self.scene(at).map(|s| s.shots.len()).unwrap_or(0);
            (0..count).map(move |sh| at.shot(sh))
        })
    }

    pub fn shot_count(&self) -> usize {
        self.shot_refs().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Script {
        serde_json::from_value(serde_json::json!({
            "chapters": [{
                "chapter_number": 1,
                "chapter_title": "Arrival",
                "chapter_description": "The ship lands",
                "key_events": ["landing"],
                "main_characters": ["Ada"],
                "scenes": [
                    {
                        "scene_number": 1,
                        "general_scene_description_and_motivations": "Ada steps out",
                        "narration_text": "It was cold.",
                        "sound_effects": ["wind"],
                        "shots": [
                            {
                                "shot_number": 1,
                                "still_image": false,
                                "detailed_opening_scene_description": "a red door",
                                "detailed_closing_scene_description": "an open door"
                            }
                        ]
                    },
                    {
                        "scene_number": 2,
                        "general_scene_description_and_motivations": "Night falls",
                        "narration_text": "",
                        "shots": null
                    }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let script = sample();
        let shot = script.shot(ShotRef::new(0, 0, 0)).unwrap();
        assert_eq!(shot.extra.get("still_image"), Some(&Value::Bool(false)));

        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(
            json["chapters"][0]["scenes"][0]["sound_effects"][0],
            "wind"
        );
    }

    #[test]
    fn test_null_shots_become_empty() {
        let script = sample();
        assert!(script.scene(SceneRef::new(0, 1)).unwrap().shots.is_empty());
    }

    #[test]
    fn test_addresses_in_document_order() {
        let script = sample();
        let scenes: Vec<_> = script.scene_refs().collect();
        assert_eq!(scenes, vec![SceneRef::new(0, 0), SceneRef::new(0, 1)]);
        assert_eq!(script.shot_count(), 1);
        assert!(script.shot(ShotRef::new(0, 1, 0)).is_none());
        assert!(script.scene(SceneRef::new(3, 0)).is_none());
    }

    #[test]
    fn test_music_prompt_falls_back_to_story() {
        let mut scene = sample().chapters[0].scenes[0].clone();
        assert_eq!(scene.music_prompt(), "Ada steps out");
        scene.background_music = Some("slow strings".to_string());
        assert_eq!(scene.music_prompt(), "slow strings");
    }
}
