//! Lazy read-through caches, ring buffers, and handler pipelines.
//!
//! The centerpiece is [`CacheManager`], a keyed TTL cache that refreshes
//! entries on demand through a caller-supplied updater and deduplicates
//! concurrent refreshes per key. [`TimedCache`] is its single-value
//! counterpart and [`MemoMap`] the expiry-free one. [`ring`] provides
//! overwrite-oldest ring buffers and [`pipeline`] middleware-style handler
//! chains.
//!
//! ```
//! use std::time::Duration;
//! use cachekit::CacheManager;
//! use cachekit_core::BoxError;
//!
//! let cache = CacheManager::new(|key: &String| -> Result<usize, BoxError> {
//!     Ok(key.len())
//! })
//! .with_keep_alive(Duration::from_secs(30));
//!
//! assert_eq!(cache.get("hello".to_string()).unwrap(), 5);
//! ```

pub mod cache;
pub mod pipeline;
pub mod ring;

pub use cache::{
    CacheEntry, CacheManager, CacheStats, Listener, ListenerSet, MemoMap, Refresher, TimedCache,
    Updater,
};
pub use cachekit_core::{BoxError, CacheError, CacheEvent, EventKind};
pub use pipeline::{Handler, Invocation, Pipeline};
pub use ring::{RingBuffer, SharedRingBuffer};
