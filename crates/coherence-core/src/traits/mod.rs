//! Core traits for cache operations

mod cache;
mod database;
mod metrics;
mod scheduler;
mod serializer;
mod tracing_metrics;

pub use cache::{Cache, Value};
pub use database::Database;
pub use metrics::{CacheMetrics, CacheOperation, NoopMetrics, RepairOutcome};
pub use scheduler::{BoundedScheduler, Task, TaskScheduler, TokioScheduler};
pub use serializer::{JsonSerializer, Serializer};
pub use tracing_metrics::TracingMetrics;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;

#[cfg(feature = "bincode")]
pub use serializer::BincodeSerializer;
