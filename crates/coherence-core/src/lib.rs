//! coherence-core: Capability traits and types for the coherence library
//!
//! This crate defines the seams the coherence decorators are written
//! against: the [`Cache`] and [`Database`] capabilities, the
//! [`TaskScheduler`] used for detached work, and the shared error type.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
