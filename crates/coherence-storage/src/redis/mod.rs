//! Redis cache adapter

mod cache;
mod config;

pub use cache::RedisCache;
pub use config::RedisConfig;
