//! Studio metrics.
//!
//! Recorded through the `metrics` facade; installing an exporter is up to
//! the embedding application.

use metrics::{counter, histogram};

use storyreel_models::{FlightClass, SlotKind};

/// Metric names as constants for consistency.
pub mod names {
    pub const GENERATIONS_TOTAL: &str = "storyreel_generations_total";
    pub const GENERATION_DURATION_SECONDS: &str = "storyreel_generation_duration_seconds";
    pub const BATCH_ITEMS_TOTAL: &str = "storyreel_batch_items_total";
    pub const BATCHES_TOTAL: &str = "storyreel_batches_total";
    pub const FETCH_FAILURES_TOTAL: &str = "storyreel_fetch_failures_total";
}

/// Record the outcome of one generation request.
pub fn record_generation(class: FlightClass, outcome: &'static str, duration_secs: f64) {
    let labels = [
        ("class", class.as_str().to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished batch.
pub fn record_batch(kind: SlotKind, succeeded: usize, failed: usize) {
    let kind = kind.as_str().to_string();
    counter!(names::BATCHES_TOTAL, "kind" => kind.clone()).increment(1);
    counter!(names::BATCH_ITEMS_TOTAL, "kind" => kind.clone(), "outcome" => "success")
        .increment(succeeded as u64);
    counter!(names::BATCH_ITEMS_TOTAL, "kind" => kind, "outcome" => "failure")
        .increment(failed as u64);
}

/// Record a failed artifact fetch (`project` or `scene` scope).
pub fn record_fetch_failure(scope: &'static str) {
    counter!(names::FETCH_FAILURES_TOTAL, "scope" => scope).increment(1);
}
