//! In-memory system of record

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use coherence_core::{CacheError, Database, Result, Value};

/// In-memory database
///
/// An absent row is reported as `CacheError::Miss`, so a read-through stack
/// over this database surfaces the same sentinel a bare cache would.
/// Cloning creates a new handle to the same rows.
pub struct MemoryDatabase<V> {
    rows: Arc<DashMap<String, V>>,
    read_latency: Duration,
}

impl<V> Clone for MemoryDatabase<V> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            read_latency: self.read_latency,
        }
    }
}

impl<V: Value> Default for MemoryDatabase<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> MemoryDatabase<V> {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            rows: Arc::new(DashMap::new()),
            read_latency: Duration::ZERO,
        }
    }

    /// Delay every `select` by `latency`, widening read/write race windows
    ///
    /// The row is read before the delay, so a slow `select` can return a
    /// value that a concurrent `upsert` has already replaced.
    pub fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = latency;
        self
    }

    /// Read a row directly, bypassing latency
    pub fn row(&self, key: &str) -> Option<V> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl<V: Value> Database<V> for MemoryDatabase<V> {
    async fn select(&self, key: &str) -> Result<V> {
        let row = self.row(key);
        if !self.read_latency.is_zero() {
            tokio::time::sleep(self.read_latency).await;
        }
        row.ok_or(CacheError::Miss)
    }

    async fn upsert(&self, key: &str, value: V) -> Result<()> {
        self.rows.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.rows.remove(key);
        Ok(())
    }
}
