//! The generation backend as seen by the studio.

use async_trait::async_trait;

use storyreel_models::wire::{
    FaceBox, FaceDetectRequest, FaceSwapRequest, ImageRequest, MusicRequest, NarrationRequest,
    NarrationUpdate, ProjectDetails, RegenerateChapterRequest, RegenerateSceneRequest, RegenerateShotRequest,
    SceneVideoRequest, ShotFieldUpdate, ShotVideoRequest,
};
use storyreel_models::{ArtifactClass, ArtifactMap, SceneRef, Script, Shot};

use crate::error::ClientResult;

/// Every backend operation the studio uses.
///
/// [`StudioClient`](crate::StudioClient) is the HTTP implementation; tests
/// substitute in-memory doubles.
#[async_trait]
pub trait StudioBackend: Send + Sync {
    async fn list_projects(&self) -> ClientResult<Vec<String>>;

    async fn load_script(&self, project: &str) -> ClientResult<Script>;

    /// Have the backend write and store the script of a new project.
    async fn create_script(&self, details: &ProjectDetails) -> ClientResult<Script>;

    /// Write one shot description through the narrow field endpoint.
    async fn update_shot_field(&self, project: &str, update: &ShotFieldUpdate) -> ClientResult<()>;

    /// Persist a whole script document.
    async fn replace_script(&self, project: &str, script: &Script) -> ClientResult<()>;

    async fn regenerate_chapter(
        &self,
        project: &str,
        request: &RegenerateChapterRequest,
    ) -> ClientResult<Script>;

    async fn regenerate_scene(
        &self,
        project: &str,
        request: &RegenerateSceneRequest,
    ) -> ClientResult<Script>;

    async fn regenerate_shot(
        &self,
        project: &str,
        request: &RegenerateShotRequest,
    ) -> ClientResult<Shot>;

    /// Generate an image; returns the base64 payload.
    async fn generate_image(&self, project: &str, request: &ImageRequest) -> ClientResult<String>;

    /// Rewrite narration text from instructions; returns the new text.
    async fn regenerate_narration(
        &self,
        project: &str,
        request: &NarrationRequest,
    ) -> ClientResult<String>;

    /// Set narration text; returns the stored text.
    async fn update_narration(&self, project: &str, update: &NarrationUpdate)
        -> ClientResult<String>;

    async fn generate_background_music(
        &self,
        project: &str,
        request: &MusicRequest,
    ) -> ClientResult<()>;

    async fn generate_shot_video(&self, project: &str, request: &ShotVideoRequest)
        -> ClientResult<()>;

    async fn generate_scene_video(
        &self,
        project: &str,
        request: &SceneVideoRequest,
    ) -> ClientResult<()>;

    /// Start generating every image of `script` on the server; returns
    /// once the work is queued.
    async fn start_image_generation(&self, project: &str, script: &Script) -> ClientResult<()>;

    /// Assemble the project's final video from `script`.
    async fn assemble_video(&self, project: &str, script: &Script) -> ClientResult<()>;

    /// Every artifact of `class` in the project.
    async fn fetch_all(&self, project: &str, class: ArtifactClass) -> ClientResult<ArtifactMap>;

    /// Artifacts of `class` for one scene.
    async fn fetch_scene(
        &self,
        project: &str,
        class: ArtifactClass,
        scene: SceneRef,
    ) -> ClientResult<ArtifactMap>;

    async fn detect_faces(
        &self,
        project: &str,
        request: &FaceDetectRequest,
    ) -> ClientResult<Vec<FaceBox>>;

    /// Swap faces from the source set onto the target; returns base64.
    async fn swap_faces(&self, project: &str, request: &FaceSwapRequest) -> ClientResult<String>;
}
