// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search-translator.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding service is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `search_translator_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: filter, pipeline, clause, full_text, prefix
//! - `status`: success, error
//! - `kind`: diagnostic or error kind

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a translation call outcome
pub fn record_translation(operation: &str, status: &str) {
    counter!(
        "search_translator_translations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a fatal translation error by kind
pub fn record_error(operation: &str, kind: &str) {
    counter!(
        "search_translator_errors_total",
        "operation" => operation.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a recoverable diagnostic by kind
pub fn record_diagnostic(kind: &str) {
    counter!(
        "search_translator_diagnostics_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a $match fold and whether the sort was embedded
pub fn record_fold(sort_embedded: bool, folded_stages: usize) {
    let outcome = if sort_embedded { "sort_embedded" } else { "sort_separate" };
    counter!(
        "search_translator_folds_total",
        "outcome" => outcome
    )
    .increment(1);
    histogram!("search_translator_folded_stages").record(folded_stages as f64);
}

/// Record translation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "search_translator_translation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_record_without_recorder() {
        // No recorder installed: calls are no-ops and must not panic.
        record_translation("filter", "success");
        record_error("pipeline", "invalid_pipeline");
        record_diagnostic("unrecognized_operator");
        record_fold(true, 3);
        record_latency("clause", Duration::from_micros(20));
    }

    #[test]
    fn test_diagnostic_counter_is_recorded() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_diagnostic("non_string_pattern");
            record_diagnostic("non_string_pattern");
        });

        let counted = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, _, _, _)| key.key().name() == "search_translator_diagnostics_total")
            .map(|(_, _, _, value)| value);

        assert_eq!(counted, Some(DebugValue::Counter(2)));
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("filter");
        }
        // Timer recorded on drop
    }
}
