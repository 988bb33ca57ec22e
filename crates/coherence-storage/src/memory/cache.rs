//! In-memory cache using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use coherence_core::{Cache, CacheError, CacheStats, Result, Value};

/// Configuration for the memory cache
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum number of entries (0 = unlimited)
    pub max_capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl MemoryConfig {
    /// Create config with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            max_capacity: capacity,
        }
    }

    /// Create config with unlimited capacity
    pub fn unlimited() -> Self {
        Self { max_capacity: 0 }
    }
}

/// Internal statistics tracking
#[derive(Debug, Default)]
struct MemoryStats {
    hits: u64,
    misses: u64,
    writes: u64,
    deletes: u64,
    evictions: u64,
}

/// In-memory cache
///
/// Cloning creates a new handle to the SAME underlying store, so a test can
/// keep one handle while a decorator owns another.
pub struct MemoryCache<V> {
    data: Arc<DashMap<String, V>>,
    stats: Arc<RwLock<MemoryStats>>,
    config: MemoryConfig,
}

impl<V> Clone for MemoryCache<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            stats: Arc::clone(&self.stats),
            config: self.config.clone(),
        }
    }
}

impl<V: Value> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<V: Value> MemoryCache<V> {
    /// Create a new memory cache
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            data: Arc::new(DashMap::with_capacity(config.max_capacity.min(10_000))),
            stats: Arc::new(RwLock::new(MemoryStats::default())),
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Evict entries if inserting `key` would exceed capacity
    fn maybe_evict(&self, key: &str) {
        if self.config.max_capacity == 0 || self.data.contains_key(key) {
            return;
        }

        // Concurrent removals may shrink the map; read the length once.
        let len = self.data.len();
        let excess = len.saturating_sub(self.config.max_capacity - 1);
        if excess == 0 {
            return;
        }

        // Victims are arbitrary; no eviction order is promised.
        let keys_to_remove: Vec<String> = self
            .data
            .iter()
            .take(excess)
            .map(|entry| entry.key().clone())
            .collect();

        for key in keys_to_remove {
            if self.data.remove(&key).is_some() {
                self.stats.write().evictions += 1;
            }
        }
    }

    /// Peek at a value without touching stats
    pub fn peek(&self, key: &str) -> Option<V> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        let stats = self.stats.read();
        CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            evictions: stats.evictions,
            size: self.data.len(),
        }
    }
}

#[async_trait]
impl<V: Value> Cache<V> for MemoryCache<V> {
    async fn get(&self, key: &str) -> Result<V> {
        let value = self.data.get(key).map(|entry| entry.value().clone());
        let mut stats = self.stats.write();
        match value {
            Some(value) => {
                stats.hits += 1;
                Ok(value)
            }
            None => {
                stats.misses += 1;
                Err(CacheError::Miss)
            }
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.maybe_evict(key);
        self.data.insert(key.to_string(), value);
        self.stats.write().writes += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.data.remove(key).is_some() {
            self.stats.write().deletes += 1;
        }
        Ok(())
    }
}
