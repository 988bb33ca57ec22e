//! coherence-storage: Cache and database adapters for coherence
//!
//! Each adapter binds one concrete store to the `Cache` or `Database`
//! capability and adds no consistency logic of its own.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "memory")]
pub use memory::{MemoryCache, MemoryConfig, MemoryDatabase};

#[cfg(feature = "redis")]
pub use redis::{RedisCache, RedisConfig};
