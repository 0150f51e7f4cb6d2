//! Shared data models for the StoryReel studio client.
//!
//! This crate provides Serde-serializable types for:
//! - The script document (chapters, scenes, shots)
//! - Artifact cache keys and the 0-based/1-based index codec
//! - Generatable slots and their strategy table
//! - Backend request/response bodies
//! - Notices and selection payloads

pub mod artifact;
pub mod error;
pub mod key;
pub mod notice;
pub mod script;
pub mod selection;
pub mod slot;
pub mod wire;

// Re-export common types
pub use artifact::{Artifact, ArtifactClass, ArtifactMap, FlightClass};
pub use error::{ModelError, ModelResult};
pub use key::{
    from_wire_index, wire_index, ArtifactKey, Frame, IndexBase, KeyCodec, KeyParts, SceneRef,
    ShotRef,
};
pub use notice::{Notice, Severity};
pub use script::{Chapter, Scene, Script, Shot};
pub use selection::Selection;
pub use slot::{Slot, SlotAddress, SlotKind, SlotScope};
