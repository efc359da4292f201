//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// Encoder output was not UTF-8.
    #[error("metrics output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Session counters, accumulated by the life cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Requests actually sent.
    pub submitted: u64,
    /// Requests that produced a parsed response.
    pub completed: u64,
    /// Requests that failed in transport or parsing.
    pub failed: u64,
    /// Submit attempts refused without a request.
    pub rejected: u64,
    /// Successful webcam snapshots.
    pub captures: u64,
    /// Camera access or snapshot failures.
    pub capture_failures: u64,
    /// Full session resets.
    pub resets: u64,
    /// Probability from the most recent completed response.
    pub last_probability: Option<f64>,
}

/// Prometheus metrics registry for the liveness client.
pub struct MetricsRegistry {
    registry: Registry,

    // Request metrics
    submitted_total: IntCounter,
    completed_total: IntCounter,
    failed_total: IntCounter,
    rejected_total: IntCounter,
    last_probability: Gauge,

    // Capture metrics
    captures_total: IntCounter,
    capture_failures_total: IntCounter,

    // Session metrics
    resets_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new registry with all client metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let submitted_total = IntCounter::new(
            "liveness_requests_submitted_total",
            "Liveness requests sent to the API",
        )?;
        let completed_total = IntCounter::new(
            "liveness_requests_completed_total",
            "Liveness requests answered with a JSON body",
        )?;
        let failed_total = IntCounter::new(
            "liveness_requests_failed_total",
            "Liveness requests that failed in transport or parsing",
        )?;
        let rejected_total = IntCounter::new(
            "liveness_submit_rejected_total",
            "Submit attempts refused because the check was disabled",
        )?;
        let last_probability = Gauge::new(
            "liveness_last_probability",
            "Liveness probability of the most recent response (-1 when not available)",
        )?;

        let captures_total = IntCounter::new(
            "liveness_webcam_captures_total",
            "Webcam snapshots taken",
        )?;
        let capture_failures_total = IntCounter::new(
            "liveness_webcam_failures_total",
            "Camera access or snapshot failures",
        )?;

        let resets_total = IntCounter::new("liveness_session_resets_total", "Full session resets")?;

        registry.register(Box::new(submitted_total.clone()))?;
        registry.register(Box::new(completed_total.clone()))?;
        registry.register(Box::new(failed_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(last_probability.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(capture_failures_total.clone()))?;
        registry.register(Box::new(resets_total.clone()))?;

        last_probability.set(-1.0);

        Ok(Self {
            registry,
            submitted_total,
            completed_total,
            failed_total,
            rejected_total,
            last_probability,
            captures_total,
            capture_failures_total,
            resets_total,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Counters only move forward: each is advanced by the difference
    /// between the snapshot and its current value.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        advance(&self.submitted_total, snapshot.submitted);
        advance(&self.completed_total, snapshot.completed);
        advance(&self.failed_total, snapshot.failed);
        advance(&self.rejected_total, snapshot.rejected);
        advance(&self.captures_total, snapshot.captures);
        advance(&self.capture_failures_total, snapshot.capture_failures);
        advance(&self.resets_total, snapshot.resets);

        self.last_probability
            .set(snapshot.last_probability.unwrap_or(-1.0));
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_update_and_encode() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            submitted: 3,
            completed: 2,
            failed: 1,
            rejected: 4,
            captures: 1,
            capture_failures: 0,
            resets: 2,
            last_probability: Some(87.0),
        };
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("liveness_requests_submitted_total 3"));
        assert!(output.contains("liveness_requests_failed_total 1"));
        assert!(output.contains("liveness_submit_rejected_total 4"));
        assert!(output.contains("liveness_last_probability 87"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&MetricsSnapshot {
            submitted: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            submitted: 2,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("liveness_requests_submitted_total 5"));
        assert!(output.contains("liveness_last_probability -1"));
    }
}
