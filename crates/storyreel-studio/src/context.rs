//! Per-project handle shared by the studio components.

use std::fmt;
use std::sync::Arc;

use storyreel_client::StudioBackend;
use storyreel_models::KeyCodec;

/// Project name, backend and key codec.
#[derive(Clone)]
pub struct ProjectContext {
    pub project: Arc<str>,
    pub backend: Arc<dyn StudioBackend>,
    pub codec: KeyCodec,
}

impl ProjectContext {
    pub fn new(project: impl Into<String>, backend: Arc<dyn StudioBackend>) -> Self {
        Self {
            project: Arc::from(project.into()),
            backend,
            codec: KeyCodec::default(),
        }
    }

    pub fn with_codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

impl fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectContext")
            .field("project", &self.project)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
