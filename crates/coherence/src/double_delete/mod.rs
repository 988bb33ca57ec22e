//! Read-through cache with delayed double-delete invalidation
//!
//! Writes run as: delete the cache entry, write the database, then schedule
//! a second delete after [`DoubleDeleteConfig::delay`]. A reader that loaded
//! the old row before the write can still refill the cache with it after
//! the first delete; the second delete removes that refill. The inconsistency
//! window is therefore bounded by the delay, provided the delay outlasts any
//! read that can race a write.

mod config;

pub use config::{DEFAULT_DELAY, DEFAULT_DELETE_TIMEOUT, DoubleDeleteConfig, ErrorHandler};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use coherence_core::{
    Cache, CacheError, CacheMetrics, CacheOperation, Database, NoopMetrics, RepairOutcome,
    Result, TaskScheduler, TokioScheduler, Value,
};

/// Where a read-through value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Database,
}

/// Full outcome of a read-through
#[derive(Debug, Clone)]
pub struct ReadThrough<V> {
    /// The authoritative value
    pub value: V,
    /// Which store answered
    pub source: ReadSource,
    /// Set when the value came from the database and refilling the cache
    /// failed. The value is still correct.
    pub repopulate_error: Option<CacheError>,
}

/// Cache decorator enforcing read-through and delayed double delete
///
/// The cache is held behind an `Arc` so that the delayed deletion can own a
/// handle that outlives both the triggering call and this decorator.
pub struct DoubleDeleteCache<C, D> {
    cache: Arc<C>,
    database: D,
    config: DoubleDeleteConfig,
    on_error: ErrorHandler,
    scheduler: Arc<dyn TaskScheduler>,
    metrics: Arc<dyn CacheMetrics>,
}

/// Builder for [`DoubleDeleteCache`]
pub struct DoubleDeleteBuilder<C, D> {
    cache: C,
    database: D,
    config: DoubleDeleteConfig,
    on_error: Option<ErrorHandler>,
    scheduler: Option<Arc<dyn TaskScheduler>>,
    metrics: Option<Arc<dyn CacheMetrics>>,
}

impl<C, D> DoubleDeleteBuilder<C, D> {
    /// Replace the timing configuration
    pub fn config(mut self, config: DoubleDeleteConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the delay before the second deletion
    pub fn delay(mut self, delay: std::time::Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Set the timeout of the second deletion
    pub fn delete_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.delete_timeout = timeout;
        self
    }

    /// Receive failures of the second deletion (default: log at error)
    pub fn error_handler(mut self, handler: impl Fn(CacheError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Run second deletions on `scheduler` (default: [`TokioScheduler`])
    pub fn scheduler(mut self, scheduler: impl TaskScheduler) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    /// Report hits, misses, latencies and repair outcomes
    pub fn metrics(mut self, metrics: impl CacheMetrics) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }

    /// Apply defaults and build the decorator
    pub fn build(self) -> DoubleDeleteCache<C, D> {
        DoubleDeleteCache {
            cache: Arc::new(self.cache),
            database: self.database,
            config: self.config.corrected(),
            on_error: self.on_error.unwrap_or_else(config::log_error_handler),
            scheduler: self.scheduler.unwrap_or_else(|| Arc::new(TokioScheduler)),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
        }
    }
}

impl<C, D> DoubleDeleteCache<C, D> {
    /// Start building a decorator over `cache` and `database`
    pub fn builder(cache: C, database: D) -> DoubleDeleteBuilder<C, D> {
        DoubleDeleteBuilder {
            cache,
            database,
            config: DoubleDeleteConfig::default(),
            on_error: None,
            scheduler: None,
            metrics: None,
        }
    }

    /// Create with all defaults
    pub fn new(cache: C, database: D) -> Self {
        Self::builder(cache, database).build()
    }

    /// The effective configuration, after defaults were applied
    pub fn config(&self) -> &DoubleDeleteConfig {
        &self.config
    }

    /// The wrapped cache
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// The wrapped database
    pub fn database(&self) -> &D {
        &self.database
    }

    /// Read from the cache, falling back to the database on a miss
    ///
    /// Only `CacheError::Miss` triggers the fallback; any other cache error
    /// is returned as is. A failed refill does not fail the read.
    pub async fn read_through<V>(&self, key: &str) -> Result<ReadThrough<V>>
    where
        V: Value,
        C: Cache<V>,
        D: Database<V>,
    {
        match <C as Cache<V>>::get(&self.cache, key).await {
            Ok(value) => {
                self.metrics.record_hit(key);
                return Ok(ReadThrough {
                    value,
                    source: ReadSource::Cache,
                    repopulate_error: None,
                });
            }
            Err(CacheError::Miss) => self.metrics.record_miss(key),
            Err(err) => return Err(err),
        }

        let value = self.database.select(key).await?;
        let repopulate_error = <C as Cache<V>>::set(&self.cache, key, value.clone())
            .await
            .err();
        if repopulate_error.is_none() {
            debug!(target: "coherence", key = %key, "cache refilled from database");
        }

        Ok(ReadThrough {
            value,
            source: ReadSource::Database,
            repopulate_error,
        })
    }

    /// Hand the second deletion of `key` to the scheduler
    fn schedule_second_delete<V>(&self, key: &str) -> Result<()>
    where
        V: Value,
        C: Cache<V>,
    {
        let cache = Arc::clone(&self.cache);
        let on_error = Arc::clone(&self.on_error);
        let metrics = Arc::clone(&self.metrics);
        let DoubleDeleteConfig {
            delay,
            delete_timeout,
        } = self.config.clone();
        let owned_key = key.to_string();

        // Owns everything it touches: dropping the caller or this decorator
        // must not stop it.
        let task = async move {
            tokio::time::sleep(delay).await;

            let deletion = <C as Cache<V>>::delete(&cache, &owned_key);
            let err = match tokio::time::timeout(delete_timeout, deletion).await {
                Ok(Ok(())) => {
                    metrics.record_repair(RepairOutcome::Deleted);
                    debug!(target: "coherence", key = %owned_key, "delayed cache deletion completed");
                    return;
                }
                Ok(Err(err)) => {
                    metrics.record_repair(RepairOutcome::Failed);
                    err
                }
                Err(_) => {
                    metrics.record_repair(RepairOutcome::TimedOut);
                    CacheError::Timeout
                }
            };
            on_error(err);
        };

        self.scheduler.submit(Box::pin(task)).inspect_err(|err| {
            self.metrics.record_repair(RepairOutcome::Rejected);
            warn!(target: "coherence", key = %key, error = %err, "delayed cache deletion rejected");
        })
    }
}

#[async_trait]
impl<V, C, D> Cache<V> for DoubleDeleteCache<C, D>
where
    V: Value,
    C: Cache<V>,
    D: Database<V>,
{
    async fn get(&self, key: &str) -> Result<V> {
        let start = Instant::now();
        let result = self.read_through::<V>(key).await;
        self.metrics.record_latency(CacheOperation::Get, start.elapsed());

        let fetched = result?;
        if let Some(err) = &fetched.repopulate_error {
            warn!(target: "coherence", key = %key, error = %err, "cache refill after read-through failed");
        }
        Ok(fetched.value)
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        let start = Instant::now();

        <C as Cache<V>>::delete(&self.cache, key).await?;
        self.database.upsert(key, value).await?;
        let scheduled = self.schedule_second_delete::<V>(key);

        self.metrics.record_latency(CacheOperation::Set, start.elapsed());
        scheduled
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let start = Instant::now();

        <C as Cache<V>>::delete(&self.cache, key).await?;
        self.database.delete(key).await?;
        let scheduled = self.schedule_second_delete::<V>(key);

        self.metrics.record_latency(CacheOperation::Delete, start.elapsed());
        scheduled
    }
}
