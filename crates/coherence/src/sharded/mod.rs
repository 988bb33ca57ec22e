//! Hash-based routing across cache buckets

mod hash;

pub use hash::{
    Fnv1a32, Fnv1a64, HashFactory, KeyHasher, Sha256Hasher, bucket_index, fnv1a32, fnv1a64,
    sha256,
};

use async_trait::async_trait;
use tracing::trace;

use coherence_core::{Cache, CacheError, Result, Value};

/// Cache that routes every key to one of a fixed list of buckets
///
/// Routing is a pure function of the key, the bucket count and the hash
/// factory, so a key always lands on the same bucket for the lifetime of the
/// router. Calls are forwarded unmodified.
pub struct ShardedCache<C> {
    buckets: Vec<C>,
    hash: HashFactory,
}

impl<C> ShardedCache<C> {
    /// Route across `buckets` with 32-bit FNV-1a
    pub fn new(buckets: Vec<C>) -> Result<Self> {
        Self::with_hash_factory(buckets, fnv1a32())
    }

    /// Route across `buckets` with a custom hash
    ///
    /// Fails with [`CacheError::Configuration`] when `buckets` is empty.
    pub fn with_hash_factory(buckets: Vec<C>, hash: HashFactory) -> Result<Self> {
        if buckets.is_empty() {
            return Err(CacheError::Configuration(
                "sharded cache needs at least one bucket".to_string(),
            ));
        }
        Ok(Self { buckets, hash })
    }

    /// Index of the bucket that owns `key`
    pub fn bucket_index(&self, key: &str) -> Result<usize> {
        let mut hasher = (self.hash)()?;
        hasher.write(key.as_bytes())?;
        bucket_index(&hasher.digest(), hasher.size(), self.buckets.len())
    }

    /// The bucket that owns `key`
    pub fn bucket(&self, key: &str) -> Result<&C> {
        let index = self.bucket_index(key)?;
        trace!(target: "coherence", key = %key, bucket = index, "routed");
        self.buckets
            .get(index)
            .ok_or_else(|| CacheError::Internal(format!("bucket {index} out of range")))
    }

    /// All buckets, in routing order
    pub fn buckets(&self) -> &[C] {
        &self.buckets
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false; construction rejects an empty bucket list
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[async_trait]
impl<V, C> Cache<V> for ShardedCache<C>
where
    V: Value,
    C: Cache<V>,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.bucket(key)?.get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.bucket(key)?.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bucket(key)?.delete(key).await
    }
}
