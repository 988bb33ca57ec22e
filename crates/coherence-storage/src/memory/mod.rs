//! In-memory adapters

mod cache;
mod database;

pub use cache::{MemoryCache, MemoryConfig};
pub use database::MemoryDatabase;
