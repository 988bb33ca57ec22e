//! Cache statistics

/// Statistics kept by storage adapters
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of write operations
    pub writes: u64,
    /// Number of delete operations that removed an entry
    pub deletes: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Current number of entries
    pub size: usize,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Merge stats from another instance, e.g. one per shard
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.writes += other.writes;
        self.deletes += other.deletes;
        self.evictions += other.evictions;
        self.size += other.size;
    }
}
