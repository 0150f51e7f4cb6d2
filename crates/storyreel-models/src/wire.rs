//! Request and response bodies exchanged with the generation backend.
//!
//! Every index in these types is already 1-based; build them with the
//! constructors, which take 0-based addresses and convert through
//! [`wire_index`](crate::key::wire_index).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::{ArtifactClass, ArtifactMap};
use crate::error::{ModelError, ModelResult};
use crate::key::{wire_index, Frame, SceneRef, ShotRef};
use crate::script::{Script, Shot};

/// Value of `status` in a success envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Generic `{status, message?}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    /// A missing status counts as success; an explicit non-success does not.
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s == STATUS_SUCCESS)
            .unwrap_or(true)
    }
}

/// Structured error body (`{"detail": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

impl ErrorBody {
    pub fn detail_text(&self) -> String {
        match &self.detail {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// `GET /list-projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<String>,
}

/// Artifact map response of the `get-all-*` / `get-scene-*` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactMapResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl ArtifactMapResponse {
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            status: self.status.clone(),
            message: self.message.clone(),
        }
    }

    /// Extract the map for `class`; a missing or null field is an empty map.
    pub fn take_map(mut self, class: ArtifactClass) -> serde_json::Result<ArtifactMap> {
        match self.fields.remove(class.map_field()) {
            None | Some(Value::Null) => Ok(ArtifactMap::new()),
            Some(value) => serde_json::from_value(value),
        }
    }
}

/// Which shot field the narrow update endpoint writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotFieldAction {
    /// Opening frame description
    Description,
    ClosingDescription,
}

/// `PUT /api/update-shot-description/{project}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotFieldUpdate {
    pub chapter_index: u32,
    pub scene_index: u32,
    pub shot_index: u32,
    pub action: ShotFieldAction,
    pub description: String,
}

impl ShotFieldUpdate {
    pub fn new(at: ShotRef, action: ShotFieldAction, description: impl Into<String>) -> Self {
        Self {
            chapter_index: wire_index(at.chapter),
            scene_index: wire_index(at.scene),
            shot_index: wire_index(at.shot),
            action,
            description: description.into(),
        }
    }
}

/// `POST /api/regenerate-chapter/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateChapterRequest {
    pub chapter_index: u32,
    pub instructions: String,
}

impl RegenerateChapterRequest {
    pub fn new(chapter: usize, instructions: impl Into<String>) -> Self {
        Self {
            chapter_index: wire_index(chapter),
            instructions: instructions.into(),
        }
    }
}

/// `POST /api/regenerate-scene/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateSceneRequest {
    pub chapter_index: u32,
    pub scene_index: u32,
    pub instructions: String,
}

impl RegenerateSceneRequest {
    pub fn new(at: SceneRef, instructions: impl Into<String>) -> Self {
        Self {
            chapter_index: wire_index(at.chapter),
            scene_index: wire_index(at.scene),
            instructions: instructions.into(),
        }
    }
}

/// `POST /api/regenerate-shot/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateShotRequest {
    pub chapter_index: u32,
    pub scene_index: u32,
    pub shot_index: u32,
    pub instructions: String,
}

impl RegenerateShotRequest {
    pub fn new(at: ShotRef, instructions: impl Into<String>) -> Self {
        Self {
            chapter_index: wire_index(at.chapter),
            scene_index: wire_index(at.scene),
            shot_index: wire_index(at.shot),
            instructions: instructions.into(),
        }
    }
}

/// `POST /api/generate-script`: everything the backend needs to write a
/// new project's script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project: String,
    pub genre: String,
    pub subject: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default)]
    pub story_background: String,
    #[serde(default = "unknown_character")]
    pub main_character_description: String,
    pub number_of_chapters: u32,
    pub number_of_scenes: u32,
    pub number_of_shots: u32,
    #[serde(default)]
    pub black_and_white: bool,
}

fn unknown_character() -> String {
    "N/A".to_string()
}

impl ProjectDetails {
    /// One chapter of one scene of one shot until told otherwise.
    pub fn new(
        project: impl Into<String>,
        genre: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            genre: genre.into(),
            subject: subject.into(),
            special_instructions: String::new(),
            story_background: String::new(),
            main_character_description: unknown_character(),
            number_of_chapters: 1,
            number_of_scenes: 1,
            number_of_shots: 1,
            black_and_white: false,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.project.trim().is_empty() {
            return Err(ModelError::InvalidProject("project name is empty".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(ModelError::InvalidProject("subject is empty".into()));
        }
        let counts = [
            ("chapters", self.number_of_chapters),
            ("scenes", self.number_of_scenes),
            ("shots", self.number_of_shots),
        ];
        if let Some((what, _)) = counts.iter().find(|(_, n)| *n == 0) {
            return Err(ModelError::InvalidProject(format!(
                "number of {what} must be at least 1"
            )));
        }
        Ok(())
    }
}

/// A regenerated script, either bare or wrapped as `{"script": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptEnvelope {
    Wrapped { script: Script },
    Bare(Script),
}

impl ScriptEnvelope {
    pub fn into_script(self) -> Script {
        match self {
            ScriptEnvelope::Wrapped { script } | ScriptEnvelope::Bare(script) => script,
        }
    }
}

/// A regenerated shot, either bare or wrapped as `{"shot": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShotEnvelope {
    Wrapped { shot: Shot },
    Bare(Shot),
}

impl ShotEnvelope {
    pub fn into_shot(self) -> Shot {
        match self {
            ShotEnvelope::Wrapped { shot } | ShotEnvelope::Bare(shot) => shot,
        }
    }
}

/// `POST /api/regenerate-image/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub chapter_index: u32,
    pub scene_index: u32,
    pub shot_index: u32,
    #[serde(rename = "type")]
    pub frame: Frame,
    pub custom_prompt: String,
    pub overwrite_image: bool,
    pub model_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    pub seed: Option<u64>,
}

impl ImageRequest {
    pub fn new(at: ShotRef, frame: Frame, prompt: impl Into<String>) -> Self {
        Self {
            chapter_index: wire_index(at.chapter),
            scene_index: wire_index(at.scene),
            shot_index: wire_index(at.shot),
            frame,
            custom_prompt: prompt.into(),
            overwrite_image: true,
            model_type: DEFAULT_IMAGE_MODEL.to_string(),
            reference_image: None,
            seed: None,
        }
    }
}

/// Image model used when the caller does not pick one.
pub const DEFAULT_IMAGE_MODEL: &str = "flux";

/// Response of the image endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub base64_image: Option<String>,
}

/// `POST /api/regenerate-narration/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub chapter_number: u32,
    pub scene_number: u32,
    pub instructions: String,
}

impl NarrationRequest {
    pub fn new(at: SceneRef, instructions: impl Into<String>) -> Self {
        Self {
            chapter_number: at.chapter_number(),
            scene_number: at.scene_number(),
            instructions: instructions.into(),
        }
    }
}

/// `PUT /api/update-narration/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationUpdate {
    pub chapter_number: u32,
    pub scene_number: u32,
    pub narration_text: String,
}

impl NarrationUpdate {
    pub fn new(at: SceneRef, narration_text: impl Into<String>) -> Self {
        Self {
            chapter_number: at.chapter_number(),
            scene_number: at.scene_number(),
            narration_text: narration_text.into(),
        }
    }
}

/// `{narration}` returned by both narration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationResponse {
    pub narration: String,
}

/// `POST /api/generate-background-music/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicRequest {
    pub chapter_number: u32,
    pub scene_number: u32,
    pub style: String,
    pub overwrite: bool,
}

impl MusicRequest {
    pub fn new(at: SceneRef, style: impl Into<String>) -> Self {
        Self {
            chapter_number: at.chapter_number(),
            scene_number: at.scene_number(),
            style: style.into(),
            overwrite: true,
        }
    }
}

/// `POST /api/generate-shot-video/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotVideoRequest {
    pub chapter_number: u32,
    pub scene_number: u32,
    pub shot_number: u32,
    pub black_and_white: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

impl ShotVideoRequest {
    pub fn new(at: ShotRef, black_and_white: bool) -> Self {
        Self {
            chapter_number: wire_index(at.chapter),
            scene_number: wire_index(at.scene),
            shot_number: wire_index(at.shot),
            black_and_white,
            model_type: None,
        }
    }
}

/// `POST /api/generate-scene-video/{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneVideoRequest {
    pub chapter_number: u32,
    pub scene_number: u32,
    pub black_and_white: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl SceneVideoRequest {
    pub fn new(at: SceneRef, black_and_white: bool) -> Self {
        Self {
            chapter_number: at.chapter_number(),
            scene_number: at.scene_number(),
            black_and_white,
            provider: None,
        }
    }
}

/// Image sent to the face endpoints.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Upload named `{stem}.{ext}`, with type and extension sniffed from
    /// the leading bytes. Unrecognized data is sent as PNG.
    pub fn new(stem: impl AsRef<str>, bytes: Vec<u8>) -> Self {
        let (mime, ext) = sniff_image(&bytes);
        Self {
            file_name: format!("{}.{ext}", stem.as_ref()),
            mime,
            bytes,
        }
    }
}

fn sniff_image(bytes: &[u8]) -> (&'static str, &'static str) {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", "jpg"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => ("image/webp", "webp"),
        [b'G', b'I', b'F', b'8', ..] => ("image/gif", "gif"),
        _ => ("image/png", "png"),
    }
}

/// `POST /api/detect-faces/{project}` (multipart + 1-based query indices).
#[derive(Debug, Clone)]
pub struct FaceDetectRequest {
    pub at: ShotRef,
    pub frame: Frame,
    pub image: ImageUpload,
}

/// A detected face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceDetectResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub faces: Vec<FaceBox>,
}

/// `POST /api/swap-faces-custom/{project}`: one target image, several sources.
#[derive(Debug, Clone)]
pub struct FaceSwapRequest {
    pub at: ShotRef,
    pub frame: Frame,
    pub target: ImageUpload,
    pub sources: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceSwapResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(alias = "base64_image")]
    pub swapped_image: Option<String>,
}
