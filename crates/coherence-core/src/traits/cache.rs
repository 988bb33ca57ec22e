//! Cache capability trait

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// Payload stored behind a cache or database
///
/// The decorators never inspect values; they only clone them when a
/// read-through refills the cache or a coalesced result fans out.
pub trait Value: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Value for T {}

/// Core trait for all caches, real or decorated
///
/// An absent key is reported as `Err(CacheError::Miss)`, which callers
/// must match on rather than inspect the message of. Implementations are
/// shared across tasks and must be safe for concurrent use.
#[async_trait]
pub trait Cache<V: Value>: Send + Sync + 'static {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> Result<V>;

    /// Set a value in the cache
    async fn set(&self, key: &str, value: V) -> Result<()>;

    /// Delete a key from the cache
    ///
    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<V: Value, C: Cache<V> + ?Sized> Cache<V> for Arc<C> {
    async fn get(&self, key: &str) -> Result<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

#[async_trait]
impl<V: Value, C: Cache<V> + ?Sized> Cache<V> for Box<C> {
    async fn get(&self, key: &str) -> Result<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}
