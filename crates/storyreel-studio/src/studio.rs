//! One project's editing session.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument};

use storyreel_client::StudioBackend;
use storyreel_models::wire::{
    FaceBox, FaceDetectRequest, FaceSwapRequest, ImageUpload, ProjectDetails,
};
use storyreel_models::{
    Artifact, ArtifactClass, ArtifactKey, FlightClass, Frame, KeyCodec, Notice, SceneRef, Script,
    Selection, ShotRef, Slot, SlotKind,
};

use crate::batch::{BatchGenerator, BatchReport};
use crate::bus::SelectionBus;
use crate::cache::MediaCache;
use crate::config::StudioConfig;
use crate::context::ProjectContext;
use crate::document::{ChapterField, ScriptPatcher, ScriptState, ScriptStore, ShotField};
use crate::error::{StudioError, StudioResult};
use crate::fetch::FetchAggregator;
use crate::generate::{GenerationOptions, SlotGenerator};
use crate::notify::{Notifier, TracingNotifier};

/// Wires the session components for one project.
pub struct StudioBuilder {
    project: String,
    backend: Arc<dyn StudioBackend>,
    notifier: Option<Arc<dyn Notifier>>,
    cache: Option<Arc<MediaCache>>,
    bus: Option<SelectionBus>,
    codec: KeyCodec,
    config: StudioConfig,
}

impl StudioBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cache(mut self, cache: Arc<MediaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn bus(mut self, bus: SelectionBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(mut self, config: StudioConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Studio {
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));
        let cache = self.cache.unwrap_or_default();
        let bus = self.bus.unwrap_or_default();
        let ctx = ProjectContext::new(self.project, self.backend).with_codec(self.codec);
        let store = ScriptStore::new();

        let generator = Arc::new(SlotGenerator::new(
            ctx.clone(),
            cache.clone(),
            store.clone(),
            notifier.clone(),
            self.config.clone(),
        ));
        let batch = BatchGenerator::new(
            generator.clone(),
            store.clone(),
            notifier.clone(),
            self.codec,
            self.config.batch_delay,
        );

        Studio {
            patcher: ScriptPatcher::new(ctx.clone(), store.clone()),
            fetcher: FetchAggregator::new(ctx.clone(), cache.clone(), notifier.clone()),
            ctx,
            cache,
            store,
            generator,
            batch,
            bus,
            notifier,
            config: self.config,
        }
    }
}

/// Editing session for one project.
///
/// Owns the media cache, the script document and the generation machinery.
/// Every user-triggered operation reports through the notifier exactly once.
pub struct Studio {
    ctx: ProjectContext,
    cache: Arc<MediaCache>,
    store: ScriptStore,
    patcher: ScriptPatcher,
    fetcher: FetchAggregator,
    generator: Arc<SlotGenerator>,
    batch: BatchGenerator,
    bus: SelectionBus,
    notifier: Arc<dyn Notifier>,
    config: StudioConfig,
}

impl Studio {
    pub fn builder(project: impl Into<String>, backend: Arc<dyn StudioBackend>) -> StudioBuilder {
        StudioBuilder {
            project: project.into(),
            backend,
            notifier: None,
            cache: None,
            bus: None,
            codec: KeyCodec::default(),
            config: StudioConfig::default(),
        }
    }

    pub fn project(&self) -> &str {
        self.ctx.project()
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    pub fn bus(&self) -> &SelectionBus {
        &self.bus
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn codec(&self) -> KeyCodec {
        self.ctx.codec
    }

    pub fn script(&self) -> Option<Arc<Script>> {
        self.store.current()
    }

    pub fn subscribe_script(&self) -> watch::Receiver<ScriptState> {
        self.store.subscribe()
    }

    pub fn is_batch_running(&self) -> bool {
        self.batch.is_running()
    }

    /// Load the script, then every artifact of the project.
    #[instrument(skip(self), fields(project = %self.ctx.project))]
    pub async fn open(&self) -> StudioResult<Arc<Script>> {
        let script = self.load_script().await?;
        self.fetcher.refresh_project().await?;
        info!("project opened");
        Ok(script)
    }

    /// Load (or reload) the script without touching the media cache.
    pub async fn load_script(&self) -> StudioResult<Arc<Script>> {
        self.patcher
            .load()
            .await
            .map_err(|e| self.report_error("Failed to load script", e))
    }

    /// Have the backend write this project's script from `details`, then
    /// commit it as the current document.
    pub async fn create_project(&self, details: &ProjectDetails) -> StudioResult<Arc<Script>> {
        let result = self.patcher.create(details).await;
        self.report(result, "Script created", "Failed to create script")
    }

    /// Queue server-side generation of every image in the current script.
    pub async fn start_image_generation(&self) -> StudioResult<()> {
        let result = self.submit_script(false).await;
        match result {
            Ok(()) => {
                self.notifier.notify(Notice::info(
                    "Image generation started",
                    "Images appear as the backend finishes them",
                ));
                Ok(())
            }
            Err(e) => Err(self.report_error("Failed to start image generation", e)),
        }
    }

    /// Have the backend assemble the final video from the current script.
    pub async fn assemble_video(&self) -> StudioResult<()> {
        let result = self.submit_script(true).await;
        self.report(result, "Video assembled", "Failed to assemble video")
    }

    async fn submit_script(&self, video: bool) -> StudioResult<()> {
        let script = self.store.current().ok_or(StudioError::NoScript)?;
        let project = self.ctx.project();
        if video {
            self.ctx.backend.assemble_video(project, &script).await?;
        } else {
            self.ctx.backend.start_image_generation(project, &script).await?;
        }
        info!(project, video, "script submitted");
        Ok(())
    }

    pub async fn refresh_project(&self) -> StudioResult<()> {
        self.fetcher.refresh_project().await
    }

    pub async fn refresh_scene(&self, at: SceneRef) -> StudioResult<()> {
        self.fetcher.refresh_scene(at).await
    }

    pub async fn generate(
        &self,
        slot: Slot,
        options: &GenerationOptions,
    ) -> StudioResult<Option<Artifact>> {
        self.generator.generate(slot, options).await
    }

    pub fn pending(&self, kind: SlotKind) -> StudioResult<Vec<Slot>> {
        self.batch.pending(kind)
    }

    pub async fn generate_all(
        &self,
        kind: SlotKind,
        options: &GenerationOptions,
    ) -> StudioResult<BatchReport> {
        match self.batch.run(kind, options).await {
            Err(StudioError::BatchInProgress) => {
                self.notifier.notify(Notice::warning(
                    "Batch already running",
                    "Wait for the current batch to finish",
                ));
                Err(StudioError::BatchInProgress)
            }
            Err(e) => Err(self.report_error("Batch failed", e)),
            Ok(report) => Ok(report),
        }
    }

    pub async fn edit_shot(
        &self,
        at: ShotRef,
        field: ShotField,
        value: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.edit_shot(at, field, value).await;
        self.report(result, "Shot saved", "Failed to save shot")
    }

    pub async fn edit_chapter(
        &self,
        chapter: usize,
        field: ChapterField,
        value: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.edit_chapter(chapter, field, value).await;
        self.report(result, "Chapter saved", "Failed to save chapter")
    }

    pub async fn edit_narration(
        &self,
        at: SceneRef,
        text: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.edit_narration(at, text).await;
        self.report(result, "Narration saved", "Failed to save narration")
    }

    pub async fn regenerate_narration(
        &self,
        at: SceneRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.regenerate_narration(at, instructions).await;
        self.report(
            result,
            "Narration regenerated",
            "Failed to regenerate narration",
        )
    }

    pub async fn regenerate_chapter(
        &self,
        chapter: usize,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.regenerate_chapter(chapter, instructions).await;
        self.report(result, "Chapter regenerated", "Failed to regenerate chapter")
    }

    pub async fn regenerate_scene(
        &self,
        at: SceneRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.regenerate_scene(at, instructions).await;
        self.report(result, "Scene regenerated", "Failed to regenerate scene")
    }

    pub async fn regenerate_shot(
        &self,
        at: ShotRef,
        instructions: impl Into<String>,
    ) -> StudioResult<Arc<Script>> {
        let result = self.patcher.regenerate_shot(at, instructions).await;
        self.report(result, "Shot regenerated", "Failed to regenerate shot")
    }

    /// Find faces in the cached image at `at`/`frame`.
    pub async fn detect_faces(&self, at: ShotRef, frame: Frame) -> StudioResult<Vec<FaceBox>> {
        let result = self.detect(at, frame).await;
        match result {
            Ok(faces) => Ok(faces),
            Err(e) => Err(self.report_error("Face detection failed", e)),
        }
    }

    async fn detect(&self, at: ShotRef, frame: Frame) -> StudioResult<Vec<FaceBox>> {
        let (_, image) = self.cached_image(at, frame)?;
        let request = FaceDetectRequest { at, frame, image };
        Ok(self
            .ctx
            .backend
            .detect_faces(self.ctx.project(), &request)
            .await?)
    }

    /// Put the faces from `sources` onto the cached image at `at`/`frame`.
    /// The swapped image replaces the cached one under the same key.
    pub async fn swap_faces(
        &self,
        at: ShotRef,
        frame: Frame,
        sources: Vec<ImageUpload>,
    ) -> StudioResult<Artifact> {
        let result = self.swap(at, frame, sources).await;
        self.report(result, "Faces swapped", "Face swap failed")
    }

    async fn swap(
        &self,
        at: ShotRef,
        frame: Frame,
        sources: Vec<ImageUpload>,
    ) -> StudioResult<Artifact> {
        let (key, target) = self.cached_image(at, frame)?;
        let request = FaceSwapRequest {
            at,
            frame,
            target,
            sources,
        };
        let backend = &self.ctx.backend;
        let project = self.ctx.project();
        self.generator
            .tracker()
            .run(FlightClass::Image, ArtifactClass::Image, key.clone(), || async {
                let image = backend.swap_faces(project, &request).await?;
                Ok::<_, StudioError>(Some(Artifact::new(image)))
            })
            .await?
            .ok_or(StudioError::MissingArtifact(key))
    }

    fn cached_image(&self, at: ShotRef, frame: Frame) -> StudioResult<(ArtifactKey, ImageUpload)> {
        let key = self.ctx.codec.image_key(at, frame);
        let artifact = self
            .cache
            .get(ArtifactClass::Image, &key)
            .ok_or_else(|| StudioError::MissingArtifact(key.clone()))?;
        let upload = ImageUpload::new(key.as_str(), artifact.decode()?);
        Ok((key, upload))
    }

    /// Publish a new active chapter/scene; returns how many listeners got it.
    pub fn select(&self, selection: Selection) -> usize {
        self.bus.publish(selection)
    }

    fn report<T>(&self, result: StudioResult<T>, done: &str, failed: &str) -> StudioResult<T> {
        match result {
            Ok(value) => {
                self.notifier.notify(Notice::success(done, ""));
                Ok(value)
            }
            Err(e) => Err(self.report_error(failed, e)),
        }
    }

    fn report_error(&self, title: &str, error: StudioError) -> StudioError {
        self.notifier.notify(error.notice(title));
        error
    }
}
