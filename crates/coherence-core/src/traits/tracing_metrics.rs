use crate::{CacheMetrics, CacheOperation, RepairOutcome};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl CacheMetrics for TracingMetrics {
    fn record_hit(&self, key: &str) {
        debug!(
            target: "coherence",
            event = "hit",
            key = %key,
            service = ?self.service_name,
            "Cache Hit"
        );
    }

    fn record_miss(&self, key: &str) {
        debug!(
            target: "coherence",
            event = "miss",
            key = %key,
            service = ?self.service_name,
            "Cache Miss"
        );
    }

    fn record_coalesced(&self, key: &str) {
        trace!(
            target: "coherence",
            event = "coalesced",
            key = %key,
            service = ?self.service_name,
            "Joined In-Flight Fetch"
        );
    }

    fn record_repair(&self, outcome: RepairOutcome) {
        match outcome {
            RepairOutcome::Deleted => debug!(
                target: "coherence",
                event = "repair",
                outcome = outcome.as_str(),
                service = ?self.service_name,
                "Delayed Delete"
            ),
            _ => warn!(
                target: "coherence",
                event = "repair",
                outcome = outcome.as_str(),
                service = ?self.service_name,
                "Delayed Delete"
            ),
        }
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        trace!(
            target: "coherence",
            event = "latency",
            operation = operation.as_str(),
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Cache Operation Latency"
        );
    }
}
