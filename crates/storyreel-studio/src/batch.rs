//! Sequential, throttled generation of every slot of one kind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use storyreel_models::{ArtifactKey, KeyCodec, Notice, Slot, SlotKind};

use crate::document::ScriptStore;
use crate::error::{StudioError, StudioResult};
use crate::generate::{GenerationOptions, SlotGenerator};
use crate::metrics;
use crate::notify::Notifier;

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub kind: SlotKind,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub succeeded_keys: Vec<ArtifactKey>,
    pub failed_keys: Vec<ArtifactKey>,
}

impl BatchReport {
    fn new(kind: SlotKind, total: usize) -> Self {
        Self {
            kind,
            total,
            succeeded: 0,
            failed: 0,
            succeeded_keys: Vec::with_capacity(total),
            failed_keys: Vec::new(),
        }
    }

    /// Final notice, its severity picked from the counts.
    pub fn notice(&self) -> Notice {
        let label = self.kind.plural_label();
        if self.total == 0 {
            Notice::info("Nothing to generate", format!("No {label} have a prompt"))
        } else if self.failed == 0 {
            Notice::success(
                "Batch complete",
                format!("Generated {} {label}", self.succeeded),
            )
        } else if self.succeeded == 0 {
            Notice::error(
                "Batch failed",
                format!("All {} {label} failed", self.failed),
            )
        } else {
            Notice::warning(
                "Batch partially complete",
                format!("{} succeeded, {} failed", self.succeeded, self.failed),
            )
        }
    }
}

/// Clears the running flag when a batch ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Generates all slots of one kind, one after another.
///
/// Targets are every slot whose source prompt is non-empty, whether or not
/// an artifact is already cached. A failure is counted and the batch goes
/// on. Only one batch runs at a time and a started batch cannot be cancelled.
pub struct BatchGenerator {
    generator: Arc<SlotGenerator>,
    store: ScriptStore,
    notifier: Arc<dyn Notifier>,
    codec: KeyCodec,
    delay: Duration,
    running: AtomicBool,
}

impl BatchGenerator {
    pub fn new(
        generator: Arc<SlotGenerator>,
        store: ScriptStore,
        notifier: Arc<dyn Notifier>,
        codec: KeyCodec,
        delay: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            notifier,
            codec,
            delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Slots a batch of `kind` would generate, in document order.
    pub fn pending(&self, kind: SlotKind) -> StudioResult<Vec<Slot>> {
        let script = self.store.current().ok_or(StudioError::NoScript)?;
        Ok(Slot::all_of(kind, &script)
            .into_iter()
            .filter(|slot| slot.has_prompt(&script))
            .collect())
    }

    #[instrument(skip(self, options), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(
        &self,
        kind: SlotKind,
        options: &GenerationOptions,
    ) -> StudioResult<BatchReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(StudioError::BatchInProgress);
        }
        let _running = RunningGuard(&self.running);

        let targets = self.pending(kind)?;
        // Each slot is generated from its own prompt.
        let options = GenerationOptions {
            custom_prompt: None,
            ..options.clone()
        };
        info!(total = targets.len(), "batch started");

        let mut report = BatchReport::new(kind, targets.len());
        for (i, slot) in targets.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let key = slot.key(&self.codec);
            match self.generator.generate_silently(slot, &options).await {
                Ok(_) => {
                    report.succeeded += 1;
                    report.succeeded_keys.push(key);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "batch item failed");
                    report.failed += 1;
                    report.failed_keys.push(key);
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "batch finished"
        );
        metrics::record_batch(kind, report.succeeded, report.failed);
        self.notifier.notify(report.notice());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MediaCache;
    use crate::config::StudioConfig;
    use crate::context::ProjectContext;
    use crate::notify::ChannelNotifier;
    use crate::testing::{script_with_openings, FakeBackend};
    use storyreel_models::{ArtifactClass, Severity};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        batch: Arc<BatchGenerator>,
        cache: Arc<MediaCache>,
        backend: Arc<FakeBackend>,
        notices: UnboundedReceiver<Notice>,
    }

    fn harness(openings: &[&str]) -> Harness {
        let script = script_with_openings(openings);
        let backend = Arc::new(FakeBackend::new(script.clone()));
        let cache = Arc::new(MediaCache::new());
        let store = ScriptStore::new();
        store.publish(script);
        let (notifier, notices) = ChannelNotifier::new();
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        let ctx = ProjectContext::new("demo", backend.clone());
        let generator = Arc::new(SlotGenerator::new(
            ctx,
            cache.clone(),
            store.clone(),
            notifier.clone(),
            StudioConfig::default(),
        ));
        let batch = Arc::new(BatchGenerator::new(
            generator,
            store,
            notifier,
            KeyCodec::default(),
            Duration::from_secs(1),
        ));
        Harness {
            batch,
            cache,
            backend,
            notices,
        }
    }

    #[test]
    fn test_report_severities() {
        let mut report = BatchReport::new(SlotKind::Music, 0);
        assert_eq!(report.notice().severity, Severity::Info);

        report.total = 3;
        report.succeeded = 3;
        assert_eq!(report.notice().severity, Severity::Success);

        report.succeeded = 2;
        report.failed = 1;
        let notice = report.notice();
        assert_eq!(notice.severity, Severity::Warning);
        assert_eq!(notice.description, "2 succeeded, 1 failed");

        report.succeeded = 0;
        report.failed = 3;
        assert_eq!(report.notice().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_pending_skips_empty_prompts() {
        let h = harness(&["a hallway", "  ", "a red door"]);
        let pending = h.batch.pending(SlotKind::OpeningImage).unwrap();
        let keys: Vec<_> = pending
            .iter()
            .map(|slot| slot.key(&KeyCodec::default()).to_string())
            .collect();
        assert_eq!(keys, vec!["1-1-1-opening", "1-1-3-opening"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted_and_batch_continues() {
        let mut h = harness(&["one", "two", "three", "four"]);
        h.backend.fail_call("generate_image", 2);
        h.backend.fail_call("generate_image", 4);

        let report = h
            .batch
            .run(SlotKind::OpeningImage, &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(h.backend.count("generate_image"), 4);
        assert_eq!(
            report.failed_keys,
            vec![
                ArtifactKey::from("1-1-2-opening"),
                ArtifactKey::from("1-1-4-opening")
            ]
        );
        assert!(h
            .cache
            .contains(ArtifactClass::Image, &ArtifactKey::from("1-1-3-opening")));
        assert!(!h.batch.is_running());

        let notice = h.notices.try_recv().unwrap();
        assert_eq!(notice.severity, Severity::Warning);
        assert!(h.notices.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_run_strictly_in_sequence() {
        let h = harness(&["one", "two", "three"]);
        h.backend.set_latency(Duration::from_millis(250));

        h.batch
            .run(SlotKind::OpeningImage, &GenerationOptions::default())
            .await
            .unwrap();

        let spans = h.backend.spans();
        assert_eq!(spans.len(), 3);
        for pair in spans.windows(2) {
            assert!(pair[1].started >= pair[0].finished + Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_batch_is_refused_while_running() {
        let h = harness(&["one", "two"]);
        h.backend.set_latency(Duration::from_millis(500));

        let running = {
            let batch = h.batch.clone();
            tokio::spawn(async move {
                batch
                    .run(SlotKind::OpeningImage, &GenerationOptions::default())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.batch.is_running());

        let second = h
            .batch
            .run(SlotKind::ClosingImage, &GenerationOptions::default())
            .await;
        assert!(matches!(second, Err(StudioError::BatchInProgress)));

        let report = running.await.unwrap().unwrap();
        assert_eq!(report.succeeded, 2);
        assert!(!h.batch.is_running());
    }

    #[tokio::test]
    async fn test_empty_batch_reports_info() {
        let mut h = harness(&[]);
        let report = h
            .batch
            .run(SlotKind::ShotVideo, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(h.notices.try_recv().unwrap().severity, Severity::Info);
    }
}
