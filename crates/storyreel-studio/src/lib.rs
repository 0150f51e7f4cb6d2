//! Client-side coordination for a StoryReel project.
//!
//! This crate provides:
//! - A media cache of generated artifacts and in-flight generations
//! - Project and scene fetches that replace or merge cached maps
//! - Per-slot generation with guaranteed in-flight cleanup
//! - Sequential, throttled batch generation
//! - Script edits committed only after the backend confirms them
//! - A selection bus between list and detail views

pub mod batch;
pub mod bus;
pub mod cache;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod metrics;
pub mod notify;
pub mod studio;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchGenerator, BatchReport};
pub use bus::{SelectionBus, SelectionFollower, SelectionSubscription};
pub use cache::MediaCache;
pub use config::StudioConfig;
pub use context::ProjectContext;
pub use document::{ChapterField, EditRoute, ScriptPatcher, ScriptState, ScriptStore, ShotField};
pub use error::{StudioError, StudioResult};
pub use fetch::FetchAggregator;
pub use generate::{GenerationOptions, SlotGenerator};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use studio::{Studio, StudioBuilder};
pub use tracker::GenerationTracker;
