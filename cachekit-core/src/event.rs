//! Change notification events emitted by the keyed cache.
//!
//! Events are broadcast to listeners after the cache releases its internal
//! locks, synchronously, on the mutating caller's thread, in subscription
//! order. Listener failures are the listener's own problem; the cache
//! neither catches nor reports them.

use serde::{Deserialize, Serialize};

/// Discriminant of a [`CacheEvent`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A value was stored or refreshed.
    Updated,
    /// A single entry was purged.
    Removed,
    /// The whole mapping was purged.
    Cleared,
}

/// A state change in the keyed cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent<K, V> {
    /// `key` now holds `value`, either via an explicit set or a successful
    /// updater call.
    Updated { key: K, value: V },
    /// `key` was purged; `value` is the last value it held.
    Removed { key: K, value: V },
    /// Every entry was purged at once. Carries no key or value.
    Cleared,
}

impl<K, V> CacheEvent<K, V> {
    /// The payload-free kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Updated { .. } => EventKind::Updated,
            Self::Removed { .. } => EventKind::Removed,
            Self::Cleared => EventKind::Cleared,
        }
    }

    /// The affected key, if the event concerns a single entry.
    pub fn key(&self) -> Option<&K> {
        match self {
            Self::Updated { key, .. } | Self::Removed { key, .. } => Some(key),
            Self::Cleared => None,
        }
    }
}
