//! Prometheus metrics for queries, pipeline stages and cleanup.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use window_common::DatasetKind;

/// Install the global Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Count a `/query` outcome.
pub fn record_query(success: bool) {
    let result = if success { "success" } else { "failed" };
    counter!("window_query_total", "result" => result).increment(1);
}

/// Record the load/reduce/clip time of one dataset kind.
pub fn record_pipeline_duration(kind: DatasetKind, elapsed: Duration) {
    histogram!("window_pipeline_duration_seconds", "kind" => kind.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_cleanup(removed: usize) {
    counter!("window_cleanup_removed_total").increment(removed as u64);
}

/// Simple timer for measuring durations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_micros() as f64 / 1000.0
    }
}
