//! The script document and its confirmed edits.
//!
//! Every edit is staged on a clone of the current document, sent to the
//! backend, and committed only once the backend confirms it. A failed send
//! drops the staged clone; the committed document and its revision stay
//! exactly as they were.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument};

use storyreel_models::wire::{
    NarrationRequest, NarrationUpdate, ProjectDetails, RegenerateChapterRequest, RegenerateSceneRequest,
    RegenerateShotRequest, ShotFieldAction, ShotFieldUpdate,
};
use storyreel_models::{ModelError, SceneRef, Script, ShotRef};

use crate::context::ProjectContext;
use crate::error::{StudioError, StudioResult};

/// A committed document and how many commits preceded it.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub revision: u64,
    pub script: Option<Arc<Script>>,
}

/// Holder of the canonical document.
///
/// Dependents subscribe to observe every committed revision.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    tx: Arc<watch::Sender<ScriptState>>,
}

impl Default for ScriptStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ScriptState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<Arc<Script>> {
        self.tx.borrow().script.clone()
    }

    pub fn revision(&self) -> u64 {
        self.tx.borrow().revision
    }

    pub fn subscribe(&self) -> watch::Receiver<ScriptState> {
        self.tx.subscribe()
    }

    /// Commit `script` as the new canonical document.
    pub fn publish(&self, script: Script) -> Arc<Script> {
        let script = Arc::new(script);
        let committed = script.clone();
        self.tx.send_modify(|state| {
            state.revision += 1;
            state.script = Some(committed);
        });
        script
    }
}

/// Shot fields editable in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotField {
    OpeningDescription,
    ClosingDescription,
    DirectorInstructions,
}

/// How an edit reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRoute {
    /// Narrow single-field endpoint
    ShotField(ShotFieldAction),
    /// Whole-document PUT
    WholeScript,
}

impl ShotField {
    /// Description edits use the field endpoint; director instructions go
    /// through the whole-script PUT. The two routes are kept distinct.
    pub fn route(&self) -> EditRoute {
        match self {
            ShotField::OpeningDescription => EditRoute::ShotField(ShotFieldAction::Description),
            ShotField::ClosingDescription => {
                EditRoute::ShotField(ShotFieldAction::ClosingDescription)
            }
            ShotField::DirectorInstructions => EditRoute::WholeScript,
        }
    }

    fn apply(&self, script: &mut Script, at: ShotRef, value: &str) -> StudioResult<()> {
        let shot = script
            .shot_mut(at)
            .ok_or_else(|| StudioError::not_found(format!("shot {at}")))?;
        match self {
            ShotField::OpeningDescription => {
                shot.detailed_opening_scene_description = value.to_string()
            }
            ShotField::ClosingDescription => {
                shot.detailed_closing_scene_description = value.to_string()
            }
            ShotField::DirectorInstructions => shot.director_instructions = Some(value.to_string()),
        }
        Ok(())
    }
}

impl std::str::FromStr for ShotField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "opening" | "opening-description" | "description" => Ok(ShotField::OpeningDescription),
            "closing" | "closing-description" => Ok(ShotField::ClosingDescription),
            "director" | "director-instructions" | "instructions" => {
                Ok(ShotField::DirectorInstructions)
            }
            other => Err(format!("unknown shot field: {other}")),
        }
    }
}

/// Chapter fields editable in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterField {
    Title,
    Description,
}

/// Applies confirmed edits to the document in a [`ScriptStore`].
///
/// Edits are serialised so each one stages from the latest commit.
#[derive(Debug)]
pub struct ScriptPatcher {
    ctx: ProjectContext,
    store: ScriptStore,
    edit_lock: Mutex<()>,
}

impl ScriptPatcher {
    pub fn new(ctx: ProjectContext, store: ScriptStore) -> Self {
        Self {
            ctx,
            store,
            edit_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    /// Load the document from the backend and commit it.
    #[instrument(skip(self), fields(project = %self.ctx.project))]
    pub async fn load(&self) -> StudioResult<Arc<Script>> {
        let _edit = self.edit_lock.lock().await;
        let script = self.ctx.backend.load_script(self.ctx.project()).await?;
        info!(
            chapters = script.chapters.len(),
            shots = script.shot_count(),
            "script loaded"
        );
        Ok(self.store.publish(script))
    }

    /// Have the backend write a new script for this project and commit it.
    #[instrument(skip(self, details), fields(project = %self.ctx.project))]
    pub async fn create(&self, details: &ProjectDetails) -> StudioResult<Arc<Script>> {
        details.validate()?;
        if details.project != self.ctx.project() {
            return Err(ModelError::InvalidProject(format!(
                "details are for {:?}, this session edits {:?}",
                details.project,
                self.ctx.project()
            ))
            .into());
        }
        let _edit = self.edit_lock.lock().await;
        let script = self.ctx.backend.create_script(details).await?;
        info!(
            chapters = script.chapters.len(),
            shots = script.shot_count(),
            "script created"
        );
        Ok(self.store.publish(script))
    }

    pub async fn edit_shot(
        &self,
        at: ShotRef,
        field: ShotField,
        value: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let value = value.into();
        let _edit = self.edit_lock.lock().await;
        let mut staged = self.staged()?;
        field.apply(&mut staged, at, &value)?;

        match field.route() {
            EditRoute::ShotField(action) => {
                let update = ShotFieldUpdate::new(at, action, value);
                self.ctx
                    .backend
                    .update_shot_field(self.ctx.project(), &update)
                    .await?;
            }
            EditRoute::WholeScript => {
                self.ctx
                    .backend
                    .replace_script(self.ctx.project(), &staged)
                    .await?;
            }
        }

        debug!(shot = %at, ?field, "shot edit confirmed");
        Ok(self.store.publish(staged))
    }

    pub async fn edit_chapter(
        &self,
        chapter: usize,
        field: ChapterField,
        value: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let value = value.into();
        let _edit = self.edit_lock.lock().await;
        let mut staged = self.staged()?;
        let target = staged
            .chapter_mut(chapter)
            .ok_or_else(|| StudioError::not_found(format!("chapter {}", chapter + 1)))?;
        match field {
            ChapterField::Title => target.chapter_title = value,
            ChapterField::Description => target.chapter_description = value,
        }

        self.ctx
            .backend
            .replace_script(self.ctx.project(), &staged)
            .await?;
        Ok(self.store.publish(staged))
    }

    /// Set a scene's narration text.
    pub async fn edit_narration(
        &self,
        at: SceneRef,
        text: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let text = text.into();
        let _edit = self.edit_lock.lock().await;
        let mut staged = self.staged()?;
        scene_mut(&mut staged, at)?.narration_text = text.clone();

        self.ctx
            .backend
            .update_narration(self.ctx.project(), &NarrationUpdate::new(at, text))
            .await?;
        Ok(self.store.publish(staged))
    }

    /// Rewrite a scene's narration from instructions; the backend's text is
    /// committed.
    pub async fn regenerate_narration(
        &self,
        at: SceneRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let _edit = self.edit_lock.lock().await;
        let mut staged = self.staged()?;
        let scene = scene_mut(&mut staged, at)?;

        let request = NarrationRequest::new(at, instructions);
        let narration = self
            .ctx
            .backend
            .regenerate_narration(self.ctx.project(), &request)
            .await?;
        scene.narration_text = narration;
        Ok(self.store.publish(staged))
    }

    /// Regenerate a chapter; the backend returns the whole document.
    pub async fn regenerate_chapter(
        &self,
        chapter: usize,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let _edit = self.edit_lock.lock().await;
        let current = self.committed()?;
        if current.chapter(chapter).is_none() {
            return Err(StudioError::not_found(format!("chapter {}", chapter + 1)));
        }

        let request = RegenerateChapterRequest::new(chapter, instructions);
        let script = self
            .ctx
            .backend
            .regenerate_chapter(self.ctx.project(), &request)
            .await?;
        Ok(self.store.publish(script))
    }

    /// Regenerate a scene; the backend returns the whole document.
    pub async fn regenerate_scene(
        &self,
        at: SceneRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let _edit = self.edit_lock.lock().await;
        let current = self.committed()?;
        if current.scene(at).is_none() {
            return Err(StudioError::not_found(format!("scene {at}")));
        }

        let request = RegenerateSceneRequest::new(at, instructions);
        let script = self
            .ctx
            .backend
            .regenerate_scene(self.ctx.project(), &request)
            .await?;
        Ok(self.store.publish(script))
    }

    /// Regenerate one shot; the returned shot replaces it in the document.
    pub async fn regenerate_shot(
        &self,
        at: ShotRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let _edit = self.edit_lock.lock().await;
        let mut staged = self.staged()?;
        let slot = staged
            .shot_mut(at)
            .ok_or_else(|| StudioError::not_found(format!("shot {at}")))?;

        let request = RegenerateShotRequest::new(at, instructions);
        let shot = self
            .ctx
            .backend
            .regenerate_shot(self.ctx.project(), &request)
            .await?;
        *slot = shot;
        Ok(self.store.publish(staged))
    }

    fn committed(&self) -> StudioResult<Arc<Script>> {
        self.store.current().ok_or(StudioError::NoScript)
    }

    fn staged(&self) -> StudioResult<Script> {
        Ok(self.committed()?.as_ref().clone())
    }
}

fn scene_mut(script: &mut Script, at: SceneRef) -> StudioResult<&mut storyreel_models::Scene> {
    script
        .scene_mut(at)
        .ok_or_else(|| StudioError::not_found(format!("scene {at}")))
}
