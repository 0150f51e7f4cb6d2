//! Pull artifact state from the backend into the media cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use storyreel_models::{ArtifactClass, ArtifactMap, Notice, SceneRef};

use crate::cache::MediaCache;
use crate::context::ProjectContext;
use crate::error::StudioResult;
use crate::metrics;
use crate::notify::Notifier;

/// Fetches the four artifact classes, project-wide or for one scene.
///
/// Each outer call emits at most one notice, never one per endpoint.
pub struct FetchAggregator {
    ctx: ProjectContext,
    cache: Arc<MediaCache>,
    notifier: Arc<dyn Notifier>,
}

impl FetchAggregator {
    pub fn new(ctx: ProjectContext, cache: Arc<MediaCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ctx,
            cache,
            notifier,
        }
    }

    /// Reload every map. On success each map is replaced, so entries the
    /// backend no longer reports disappear; any failure applies nothing.
    #[instrument(skip(self), fields(project = %self.ctx.project))]
    pub async fn refresh_project(&self) -> StudioResult<()> {
        match self.fetch_project().await {
            Ok(maps) => {
                let count = |class: ArtifactClass| maps.get(&class).map(|m| m.len()).unwrap_or(0);
                let summary = format!(
                    "{} images, {} narrations, {} music tracks, {} videos",
                    count(ArtifactClass::Image),
                    count(ArtifactClass::Narration),
                    count(ArtifactClass::Music),
                    count(ArtifactClass::Video),
                );
                self.cache.replace_all(maps);
                info!(%summary, "project media loaded");
                self.notifier.notify(Notice::info("Media loaded", summary));
                Ok(())
            }
            Err(e) => {
                metrics::record_fetch_failure("project");
                warn!(error = %e, "project media fetch failed");
                self.notifier.notify(e.notice("Failed to load media"));
                Err(e)
            }
        }
    }

    /// Reload one scene's artifacts and merge them; other scenes keep their
    /// cached entries. Silent on success.
    #[instrument(skip(self), fields(project = %self.ctx.project, scene = %at))]
    pub async fn refresh_scene(&self, at: SceneRef) -> StudioResult<()> {
        match self.fetch_scene(at).await {
            Ok(maps) => {
                for (class, map) in maps {
                    self.cache.merge(class, map);
                }
                Ok(())
            }
            Err(e) => {
                metrics::record_fetch_failure("scene");
                warn!(error = %e, "scene media fetch failed");
                self.notifier
                    .notify(e.notice(format!("Failed to load media for scene {at}")));
                Err(e)
            }
        }
    }

    async fn fetch_project(&self) -> StudioResult<HashMap<ArtifactClass, ArtifactMap>> {
        let backend = &self.ctx.backend;
        let project = self.ctx.project();
        let (images, narrations, music, videos) = tokio::try_join!(
            backend.fetch_all(project, ArtifactClass::Image),
            backend.fetch_all(project, ArtifactClass::Narration),
            backend.fetch_all(project, ArtifactClass::Music),
            backend.fetch_all(project, ArtifactClass::Video),
        )?;
        Ok(collect(images, narrations, music, videos))
    }

    async fn fetch_scene(&self, at: SceneRef) -> StudioResult<HashMap<ArtifactClass, ArtifactMap>> {
        let backend = &self.ctx.backend;
        let project = self.ctx.project();
        let (images, narrations, music, videos) = tokio::try_join!(
            backend.fetch_scene(project, ArtifactClass::Image, at),
            backend.fetch_scene(project, ArtifactClass::Narration, at),
            backend.fetch_scene(project, ArtifactClass::Music, at),
            backend.fetch_scene(project, ArtifactClass::Video, at),
        )?;
        Ok(collect(images, narrations, music, videos))
    }
}

fn collect(
    images: ArtifactMap,
    narrations: ArtifactMap,
    music: ArtifactMap,
    videos: ArtifactMap,
) -> HashMap<ArtifactClass, ArtifactMap> {
    HashMap::from([
        (ArtifactClass::Image, images),
        (ArtifactClass::Narration, narrations),
        (ArtifactClass::Music, music),
        (ArtifactClass::Video, videos),
    ])
}
