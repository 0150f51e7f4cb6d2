//! Studio error types.

use thiserror::Error;

use storyreel_client::ClientError;
use storyreel_models::{ArtifactKey, ModelError, Notice};

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Backend error: {0}")]
    Client(#[from] ClientError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generation already in progress for {0}")]
    InFlight(ArtifactKey),

    #[error("A batch generation is already running")]
    BatchInProgress,

    #[error("No script loaded")]
    NoScript,

    #[error("Nothing to generate from for {0}")]
    EmptyPrompt(String),

    #[error("No cached image at {0}")]
    MissingArtifact(ArtifactKey),
}

impl StudioError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Short user-facing description.
    pub fn description(&self) -> String {
        match self {
            StudioError::Client(e) => e.description(),
            other => other.to_string(),
        }
    }

    /// Normalise into a single error notice.
    pub fn notice(&self, title: impl Into<String>) -> Notice {
        Notice::error(title, self.description())
    }
}
