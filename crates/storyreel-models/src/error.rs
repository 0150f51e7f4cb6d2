//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),

    #[error("Wire indices are 1-based, got {0}")]
    InvalidWireIndex(u32),

    #[error("Unknown frame: {0}")]
    UnknownFrame(String),

    #[error("Unknown slot kind: {0}")]
    UnknownSlotKind(String),

    #[error("Invalid project details: {0}")]
    InvalidProject(String),

    #[error("Artifact is a URL, not an inline payload")]
    NotInline,

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl ModelError {
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }
}
