//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
///
/// `Clone` so that a single outcome can be handed to every caller that
/// joined a coalesced fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key is absent. A sentinel, not a failure.
    #[error("cache miss")]
    Miss,

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Backend connection failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend operation failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid construction-time configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The task scheduler refused a submission
    #[error("task rejected by scheduler: {0}")]
    Scheduling(String),

    /// Constructing or feeding a shard hasher failed
    #[error("hash error: {0}")]
    Hash(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// Timeout
    #[error("operation timed out")]
    Timeout,
}

impl CacheError {
    /// Check if this is the cache-miss sentinel
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
