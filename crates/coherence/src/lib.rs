//! coherence: Composable cache-consistency decorators
//!
//! Every decorator implements [`Cache`] and wraps another [`Cache`], so they
//! stack in any order:
//!
//! - [`DoubleDeleteCache`] reads through to a [`Database`] on a miss and
//!   invalidates with a delete, write, delayed-delete sequence.
//! - [`CoalescingCache`] collapses concurrent `get`s for one key into a
//!   single fetch.
//! - [`ShardedCache`] routes each key to one of N buckets by hash.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coherence::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let database = MemoryDatabase::<String>::new();
//!     let buckets = (0..4)
//!         .map(|_| {
//!             let ddd = DoubleDeleteCache::builder(MemoryCache::with_defaults(), database.clone())
//!                 .build();
//!             CoalescingCache::<_, String>::new(ddd)
//!         })
//!         .collect();
//!     let cache = ShardedCache::new(buckets)?;
//!
//!     cache.set("user:1", "ada".to_string()).await?;
//!     assert_eq!(cache.get("user:1").await?, "ada");
//!
//!     cache.delete("user:1").await?;
//!     assert!(cache.get("user:1").await.unwrap_err().is_miss());
//!     Ok(())
//! }
//! ```

mod coalesce;
mod double_delete;
mod sharded;

// Re-export core
pub use coherence_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use coherence_storage::{MemoryCache, MemoryConfig, MemoryDatabase};

#[cfg(feature = "redis")]
pub use coherence_storage::{RedisCache, RedisConfig};

pub use coalesce::CoalescingCache;
pub use double_delete::{
    DEFAULT_DELAY, DEFAULT_DELETE_TIMEOUT, DoubleDeleteBuilder, DoubleDeleteCache,
    DoubleDeleteConfig, ErrorHandler, ReadSource, ReadThrough,
};
pub use sharded::{
    Fnv1a32, Fnv1a64, HashFactory, KeyHasher, Sha256Hasher, ShardedCache, bucket_index, fnv1a32,
    fnv1a64, sha256,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Cache, CacheError, CoalescingCache, Database, DoubleDeleteCache, DoubleDeleteConfig,
        Result, ShardedCache, TaskScheduler, TokioScheduler,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryCache, MemoryConfig, MemoryDatabase};

    #[cfg(feature = "redis")]
    pub use crate::{RedisCache, RedisConfig};
}
