//! Core types shared by adapters

mod stats;

pub use stats::CacheStats;
