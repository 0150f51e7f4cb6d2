//! Active chapter/scene selection shared between views.

use serde::{Deserialize, Serialize};

use crate::key::SceneRef;

/// Payload of a selection change (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub chapter_index: usize,
    pub scene_index: usize,
}

impl Selection {
    pub fn new(chapter_index: usize, scene_index: usize) -> Self {
        Self {
            chapter_index,
            scene_index,
        }
    }

    pub fn scene_ref(&self) -> SceneRef {
        SceneRef::new(self.chapter_index, self.scene_index)
    }
}

impl From<SceneRef> for Selection {
    fn from(at: SceneRef) -> Self {
        Self::new(at.chapter, at.scene)
    }
}
