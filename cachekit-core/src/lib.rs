//! cachekit core - shared data types.
//!
//! Pure data structures with no behavior: the cache event model and the
//! error taxonomy. The pattern implementations live in the `cachekit` crate.

pub mod error;
pub mod event;

pub use error::{BoxError, CacheError};
pub use event::{CacheEvent, EventKind};
