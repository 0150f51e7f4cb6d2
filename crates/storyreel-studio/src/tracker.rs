//! Per-key generation tracking.
//!
//! A key is Idle until [`GenerationTracker::run`] inserts it into the
//! in-flight set of its class, and Idle again once the run settles. There is
//! no failed state: the error goes back to the caller and the key is free for
//! an immediate retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use storyreel_models::{Artifact, ArtifactClass, ArtifactKey, FlightClass};

use crate::cache::MediaCache;
use crate::error::{StudioError, StudioResult};
use crate::metrics;

/// Removes its key from the in-flight set when dropped.
///
/// Dropping covers success, failure, panics and a cancelled future alike.
struct FlightGuard {
    cache: Arc<MediaCache>,
    class: FlightClass,
    key: ArtifactKey,
}

impl FlightGuard {
    fn acquire(cache: Arc<MediaCache>, class: FlightClass, key: ArtifactKey) -> Option<Self> {
        if !cache.begin(class, key.clone()) {
            return None;
        }
        Some(Self { cache, class, key })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.cache.finish(self.class, &self.key);
    }
}

/// Runs generation requests against the media cache.
#[derive(Debug, Clone)]
pub struct GenerationTracker {
    cache: Arc<MediaCache>,
}

impl GenerationTracker {
    pub fn new(cache: Arc<MediaCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    /// Run `op` for `key`.
    ///
    /// `Ok(Some(artifact))` overwrites the `class` map entry at `key`;
    /// `Ok(None)` means the backend accepted the request but the artifact is
    /// not available yet, and the map is left alone. Errors leave the map
    /// alone too. A key that is already in flight is refused with
    /// [`StudioError::InFlight`].
    pub async fn run<F, Fut>(
        &self,
        flight: FlightClass,
        class: ArtifactClass,
        key: ArtifactKey,
        op: F,
    ) -> StudioResult<Option<Artifact>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StudioResult<Option<Artifact>>>,
    {
        let _guard = FlightGuard::acquire(self.cache.clone(), flight, key.clone())
            .ok_or_else(|| StudioError::InFlight(key.clone()))?;

        debug!(key = %key, class = %flight, "generation started");
        let started = Instant::now();
        let result = op().await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(Some(artifact)) => {
                self.cache.insert(class, key.clone(), artifact.clone());
                metrics::record_generation(flight, "success", elapsed);
                debug!(key = %key, elapsed, "generation stored");
            }
            Ok(None) => {
                metrics::record_generation(flight, "accepted", elapsed);
                debug!(key = %key, elapsed, "generation accepted without artifact");
            }
            Err(e) => {
                metrics::record_generation(flight, "failure", elapsed);
                warn!(key = %key, error = %e, "generation failed");
            }
        }

        result
    }
}
