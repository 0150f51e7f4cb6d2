//! One generation path for every slot kind.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use storyreel_models::wire::{ImageRequest, MusicRequest, SceneVideoRequest, ShotVideoRequest};
use storyreel_models::{
    Artifact, ArtifactClass, ArtifactKey, Notice, SceneRef, Script, Slot, SlotAddress, SlotKind,
};

use crate::cache::MediaCache;
use crate::config::StudioConfig;
use crate::context::ProjectContext;
use crate::document::ScriptStore;
use crate::error::{StudioError, StudioResult};
use crate::metrics;
use crate::notify::Notifier;
use crate::tracker::GenerationTracker;

/// Caller overrides for one generation.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Image prompt used instead of the shot description
    pub custom_prompt: Option<String>,
    /// Image or shot video model
    pub model: Option<String>,
    pub seed: Option<u64>,
    /// Base64 image the backend conditions on
    pub reference_image: Option<String>,
    pub overwrite: bool,
    pub music_style: Option<String>,
    /// Scene video provider
    pub provider: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            custom_prompt: None,
            model: None,
            seed: None,
            reference_image: None,
            overwrite: true,
            music_style: None,
            provider: None,
        }
    }
}

impl GenerationOptions {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Generates single slots through the tracker.
///
/// Images come back inline. Music and videos only come back as a status, so
/// the artifact is resolved by re-fetching that class for the slot's scene.
pub struct SlotGenerator {
    ctx: ProjectContext,
    cache: Arc<MediaCache>,
    tracker: GenerationTracker,
    store: ScriptStore,
    notifier: Arc<dyn Notifier>,
    config: StudioConfig,
}

impl SlotGenerator {
    pub fn new(
        ctx: ProjectContext,
        cache: Arc<MediaCache>,
        store: ScriptStore,
        notifier: Arc<dyn Notifier>,
        config: StudioConfig,
    ) -> Self {
        Self {
            tracker: GenerationTracker::new(cache.clone()),
            ctx,
            cache,
            store,
            notifier,
            config,
        }
    }

    pub fn tracker(&self) -> &GenerationTracker {
        &self.tracker
    }

    /// Generate `slot` and emit one notice describing the outcome.
    pub async fn generate(
        &self,
        slot: Slot,
        options: &GenerationOptions,
    ) -> StudioResult<Option<Artifact>> {
        let result = self.generate_silently(slot, options).await;
        let notice = match &result {
            Ok(Some(_)) => Notice::success("Generation complete", format!("Generated {slot}")),
            Ok(None) => Notice::warning(
                "Generation submitted",
                format!("{slot} was accepted but is not available yet"),
            ),
            Err(e) => e.notice(format!("Failed to generate {slot}")),
        };
        self.notifier.notify(notice);
        result
    }

    /// Generate `slot` without notices; batches report once at the end.
    #[instrument(skip(self, slot, options), fields(project = %self.ctx.project, slot = %slot))]
    pub async fn generate_silently(
        &self,
        slot: Slot,
        options: &GenerationOptions,
    ) -> StudioResult<Option<Artifact>> {
        let script = self.store.current().ok_or(StudioError::NoScript)?;
        let source = slot
            .source_prompt(&script)
            .ok_or_else(|| StudioError::not_found(slot.to_string()))?;
        let prompt = options
            .custom_prompt
            .clone()
            .unwrap_or_else(|| source.to_string());

        let key = slot.key(&self.ctx.codec);
        self.tracker
            .run(
                slot.kind.flight_class(),
                slot.kind.artifact_class(),
                key.clone(),
                || self.dispatch(slot, &script, &prompt, options, &key),
            )
            .await
    }

    async fn dispatch(
        &self,
        slot: Slot,
        script: &Script,
        prompt: &str,
        options: &GenerationOptions,
        key: &ArtifactKey,
    ) -> StudioResult<Option<Artifact>> {
        let backend = &self.ctx.backend;
        let project = self.ctx.project();

        match (slot.kind, slot.address) {
            (SlotKind::OpeningImage | SlotKind::ClosingImage, SlotAddress::Shot(at)) => {
                if prompt.trim().is_empty() {
                    return Err(StudioError::EmptyPrompt(slot.to_string()));
                }
                let frame = slot
                    .kind
                    .frame()
                    .ok_or_else(|| StudioError::not_found(slot.to_string()))?;
                let mut request = ImageRequest::new(at, frame, prompt);
                request.overwrite_image = options.overwrite;
                request.seed = options.seed;
                request.reference_image = options.reference_image.clone();
                if let Some(model) = &options.model {
                    request.model_type = model.clone();
                }
                let image = backend.generate_image(project, &request).await?;
                Ok(Some(Artifact::new(image)))
            }
            (SlotKind::ShotVideo, SlotAddress::Shot(at)) => {
                let mut request = ShotVideoRequest::new(at, script.black_and_white);
                request.model_type = options.model.clone();
                backend.generate_shot_video(project, &request).await?;
                Ok(self.resolve(ArtifactClass::Video, at.scene_ref(), key).await)
            }
            (SlotKind::Music, SlotAddress::Scene(at)) => {
                // `script.style` is the visual style; music never inherits it.
                let style = options
                    .music_style
                    .clone()
                    .unwrap_or_else(|| self.config.default_music_style.clone());
                let mut request = MusicRequest::new(at, style);
                request.overwrite = options.overwrite;
                backend.generate_background_music(project, &request).await?;
                Ok(self.resolve(ArtifactClass::Music, at, key).await)
            }
            (SlotKind::SceneVideo, SlotAddress::Scene(at)) => {
                let mut request = SceneVideoRequest::new(at, script.black_and_white);
                request.provider = options.provider.clone();
                backend.generate_scene_video(project, &request).await?;
                Ok(self.resolve(ArtifactClass::Video, at, key).await)
            }
            _ => Err(StudioError::not_found(slot.to_string())),
        }
    }

    /// Re-fetch `class` for one scene, merge it, and pick out `key`.
    ///
    /// The generation itself already succeeded, so a failed re-fetch only
    /// means the artifact is not visible yet.
    async fn resolve(
        &self,
        class: ArtifactClass,
        at: SceneRef,
        key: &ArtifactKey,
    ) -> Option<Artifact> {
        match self.ctx.backend.fetch_scene(self.ctx.project(), class, at).await {
            Ok(map) => {
                let artifact = map.get(key).cloned();
                self.cache.merge(class, map);
                if artifact.is_none() {
                    info!(key = %key, "artifact not yet listed by the backend");
                }
                artifact
            }
            Err(e) => {
                metrics::record_fetch_failure("scene");
                warn!(key = %key, error = %e, "could not re-fetch generated artifact");
                None
            }
        }
    }
}
