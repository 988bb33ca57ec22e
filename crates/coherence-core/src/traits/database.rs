//! Database capability trait

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Result, Value};

/// The system of record behind a read-through cache
#[async_trait]
pub trait Database<V: Value>: Send + Sync + 'static {
    /// Read the authoritative value for a key
    async fn select(&self, key: &str) -> Result<V>;

    /// Insert or replace the value for a key
    async fn upsert(&self, key: &str, value: V) -> Result<()>;

    /// Remove a key
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<V: Value, D: Database<V> + ?Sized> Database<V> for Arc<D> {
    async fn select(&self, key: &str) -> Result<V> {
        (**self).select(key).await
    }

    async fn upsert(&self, key: &str, value: V) -> Result<()> {
        (**self).upsert(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

#[async_trait]
impl<V: Value, D: Database<V> + ?Sized> Database<V> for Box<D> {
    async fn select(&self, key: &str) -> Result<V> {
        (**self).select(key).await
    }

    async fn upsert(&self, key: &str, value: V) -> Result<()> {
        (**self).upsert(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}
