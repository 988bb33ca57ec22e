//! Configuration for the delayed double-delete decorator

use std::sync::Arc;
use std::time::Duration;

use coherence_core::CacheError;

/// Default wait before the second deletion
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Default timeout for the second deletion itself
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(500);

/// Receives failures of the delayed second deletion
pub type ErrorHandler = Arc<dyn Fn(CacheError) + Send + Sync>;

/// Timing for the delayed second deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleDeleteConfig {
    /// Wait between the write and the second deletion. Must exceed the
    /// longest read that can race a write.
    pub delay: Duration,
    /// Timeout for the second deletion, independent of the caller
    pub delete_timeout: Duration,
}

impl Default for DoubleDeleteConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }
}

impl DoubleDeleteConfig {
    /// Set the delay before the second deletion
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the timeout of the second deletion
    pub fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    /// Replace zero durations with the defaults
    pub(crate) fn corrected(mut self) -> Self {
        if self.delay.is_zero() {
            self.delay = DEFAULT_DELAY;
        }
        if self.delete_timeout.is_zero() {
            self.delete_timeout = DEFAULT_DELETE_TIMEOUT;
        }
        self
    }
}

pub(crate) fn log_error_handler() -> ErrorHandler {
    Arc::new(|err| {
        tracing::error!(target: "coherence", error = %err, "delayed cache deletion failed");
    })
}
