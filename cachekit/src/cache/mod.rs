//! Read-through caching.
//!
//! Three shapes of the same idea, from most to least structure:
//!
//! - [`CacheManager`]: keyed entries, each refreshed on demand by an updater
//!   bound at construction, with optional TTL and change events.
//! - [`TimedCache`]: a single value with a TTL and a zero-argument
//!   refresher.
//! - [`MemoMap`]: keyed memoization where the initializer is supplied per
//!   call and nothing ever expires on its own.
//!
//! All three are lock-based and safe to share across threads behind an
//! `Arc`. None of them spawns threads or runs timers; staleness is
//! re-evaluated lazily on access.

pub mod entry;
pub mod manager;
pub mod memo;
pub mod notify;
pub mod timed;
pub mod updater;

pub use entry::CacheEntry;
pub use manager::{CacheManager, CacheStats};
pub use memo::MemoMap;
pub use notify::{Listener, ListenerSet};
pub use timed::TimedCache;
pub use updater::{Refresher, Updater};
