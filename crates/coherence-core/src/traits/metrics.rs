//! Metrics hooks for decorator observability

use std::time::Duration;

/// Decorator operation for latency tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    Get,
    Set,
    Delete,
}

impl CacheOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Get => "get",
            CacheOperation::Set => "set",
            CacheOperation::Delete => "delete",
        }
    }
}

/// Outcome of a delayed second deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairOutcome {
    /// The stale entry (if any) was removed
    Deleted,
    /// The cache reported an error
    Failed,
    /// The deletion exceeded its timeout
    TimedOut,
    /// The scheduler refused the task
    Rejected,
}

impl RepairOutcome {
    /// Get outcome as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairOutcome::Deleted => "deleted",
            RepairOutcome::Failed => "failed",
            RepairOutcome::TimedOut => "timed_out",
            RepairOutcome::Rejected => "rejected",
        }
    }
}

/// Trait for decorator metrics
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a read served by the cache
    fn record_hit(&self, key: &str);

    /// Record a read that fell through to the database
    fn record_miss(&self, key: &str);

    /// Record a caller that joined an in-flight fetch instead of starting one
    fn record_coalesced(&self, key: &str);

    /// Record the outcome of a delayed second deletion
    fn record_repair(&self, outcome: RepairOutcome);

    /// Record operation latency
    fn record_latency(&self, operation: CacheOperation, duration: Duration);
}

/// No-op metrics implementation (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _key: &str) {}

    #[inline]
    fn record_miss(&self, _key: &str) {}

    #[inline]
    fn record_coalesced(&self, _key: &str) {}

    #[inline]
    fn record_repair(&self, _outcome: RepairOutcome) {}

    #[inline]
    fn record_latency(&self, _operation: CacheOperation, _duration: Duration) {}
}

/// Metrics adapter using the `metrics` crate
///
/// # Example
/// ```ignore
/// use coherence_core::MetricsCrateAdapter;
///
/// let metrics = MetricsCrateAdapter::new("coherence");
/// // Emits: coherence_hits_total, coherence_repairs_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _key: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _key: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_coalesced(&self, _key: &str) {
        metrics::counter!(self.metric_name("coalesced_total")).increment(1);
    }

    fn record_repair(&self, outcome: RepairOutcome) {
        metrics::counter!(
            self.metric_name("repairs_total"),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }
}
