//! Redis-backed cache over a bb8 connection pool

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use coherence_core::{Cache, CacheError, JsonSerializer, Result, Serializer, Value};

use super::config::RedisConfig;

/// Redis-backed cache
///
/// Values are encoded with `S` (JSON by default). Expiry, if any, is the
/// server's job; `RedisConfig::ttl` is passed through on every write.
pub struct RedisCache<V, S = JsonSerializer> {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    serializer: S,
    _value: PhantomData<fn() -> V>,
}

impl<V, S: Clone> Clone for RedisCache<V, S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            config: self.config.clone(),
            serializer: self.serializer.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> RedisCache<V, JsonSerializer> {
    /// Connect with the JSON serializer
    pub async fn new(config: RedisConfig) -> Result<Self> {
        Self::with_serializer(config, JsonSerializer).await
    }
}

impl<V, S: Serializer> RedisCache<V, S> {
    /// Connect with a custom serializer
    pub async fn with_serializer(config: RedisConfig, serializer: S) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::debug!(
            target: "coherence",
            url = %config.url,
            serializer = serializer.name(),
            "redis cache connected"
        );

        Ok(Self {
            pool,
            config,
            serializer,
            _value: PhantomData,
        })
    }

    /// Get connection from pool
    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl<V, S> Cache<V> for RedisCache<V, S>
where
    V: Value + Serialize + DeserializeOwned,
    S: Serializer,
{
    async fn get(&self, key: &str) -> Result<V> {
        let mut conn = self.get_connection().await?;
        let prefixed = self.config.prefixed_key(key);

        let bytes: Option<Vec<u8>> = conn
            .get(&prefixed)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        match bytes {
            Some(data) => self.serializer.decode(&data),
            None => Err(CacheError::Miss),
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        let encoded = self.serializer.encode(&value)?;
        let mut conn = self.get_connection().await?;
        let prefixed = self.config.prefixed_key(key);

        match self.config.ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(&prefixed, encoded, ttl.as_secs().max(1))
                .await
                .map_err(|e| CacheError::Backend(e.to_string())),
            None => conn
                .set::<_, _, ()>(&prefixed, encoded)
                .await
                .map_err(|e| CacheError::Backend(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let prefixed = self.config.prefixed_key(key);

        conn.del::<_, ()>(&prefixed)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}
