//! HTTP client for the StoryReel generation backend.
//!
//! The backend owns every expensive decision (script writing, image, voice,
//! music and video synthesis, face swapping). This crate exposes it as the
//! [`StudioBackend`] trait, implemented over REST by [`StudioClient`].

pub mod backend;
pub mod client;
pub mod config;
pub mod error;

pub use backend::StudioBackend;
pub use client::StudioClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
