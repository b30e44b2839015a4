//! Keyed memoizing cache with TTL and change notification.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use cachekit_core::{CacheError, CacheEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::entry::CacheEntry;
use super::notify::ListenerSet;
use super::updater::Updater;

/// Structural counters, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently in the mapping, valid or not.
    pub total_entries: usize,
    /// Entries whose cached value is currently authoritative.
    pub valid_entries: usize,
}

/// Lazily-populated, per-key memoizing cache.
///
/// The manager owns the key→entry mapping behind a shared/exclusive lock
/// that protects only the mapping's *structure*. Value state lives in each
/// [`CacheEntry`] behind that entry's own lock, so refreshes of different
/// keys fully parallelize and the manager lock is never held during
/// entry-level work.
///
/// # Example
///
/// ```
/// use cachekit::cache::CacheManager;
/// use cachekit_core::BoxError;
///
/// let cache: CacheManager<u32, String> =
///     CacheManager::new(|key: &u32| -> Result<String, BoxError> { Ok(key.to_string()) });
///
/// assert_eq!(cache.get(7).unwrap(), "7");
/// cache.set(7, "seven".to_string());
/// assert_eq!(cache.get(7).unwrap(), "seven");
/// ```
pub struct CacheManager<K, V> {
    entries: RwLock<HashMap<K, Arc<CacheEntry<K, V>>>>,
    updater: Arc<dyn Updater<K, V>>,
    keep_alive: Option<Duration>,
    listeners: Arc<ListenerSet<K, V>>,
}

impl<K, V> CacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache bound to `updater`, without TTL: once a key is
    /// populated it stays valid until invalidated, purged, or force-updated.
    pub fn new<U>(updater: U) -> Self
    where
        U: Updater<K, V> + 'static,
    {
        Self {
            entries: RwLock::new(HashMap::new()),
            updater: Arc::new(updater),
            keep_alive: None,
            listeners: Arc::new(ListenerSet::new()),
        }
    }

    /// Give every entry a TTL: a valid value decays to stale once
    /// `keep_alive` has elapsed since its last update, and the next access
    /// refreshes it lazily.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Register a change listener. Listeners are invoked synchronously on
    /// the mutating thread, in subscription order, with no cache lock held.
    /// There is no unsubscribe.
    pub fn subscribe<L>(&self, listener: L)
    where
        L: Fn(&CacheEvent<K, V>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener));
    }

    /// Look up an existing entry. Never creates one.
    pub fn find(&self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        self.entries.read().get(key).cloned()
    }

    /// Return the entry for `key`, creating it if absent.
    ///
    /// Double-checked: fast path under the read lock, then upgrade to the
    /// write lock and re-check, since another thread may have inserted the
    /// key while no lock was held. At most one entry object per key ever
    /// exists.
    pub fn find_or_create(&self, key: K) -> Arc<CacheEntry<K, V>> {
        if let Some(entry) = self.entries.read().get(&key) {
            return Arc::clone(entry);
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(&key) {
            return Arc::clone(entry);
        }

        let entry = Arc::new(CacheEntry::new(
            key.clone(),
            self.keep_alive,
            Arc::clone(&self.updater),
            Arc::clone(&self.listeners),
        ));
        entries.insert(key, Arc::clone(&entry));
        debug!(total = entries.len(), "created cache entry");
        entry
    }

    /// Memoized read: refreshes via the updater only if the entry is
    /// missing, invalid, or past its TTL.
    pub fn get(&self, key: K) -> Result<V, CacheError> {
        self.find_or_create(key).ensure()
    }

    /// Forced refresh: always contacts the updater, regardless of validity.
    pub fn update(&self, key: K) -> Result<V, CacheError> {
        self.find_or_create(key).force()
    }

    /// Force-refresh every known key, sequentially.
    ///
    /// The key set is snapshotted under the read lock so no lock is held
    /// during the updater calls. Aborts on the first updater error, and
    /// checks `cancel` between keys (never mid-updater); earlier keys stay
    /// refreshed either way.
    pub fn update_all(&self, cancel: &CancellationToken) -> Result<(), CacheError> {
        let keys: Vec<K> = self.entries.read().keys().cloned().collect();
        debug!(keys = keys.len(), "refreshing all cache entries");
        for key in keys {
            self.update(key)?;
            if cancel.is_cancelled() {
                return Err(CacheError::Cancelled);
            }
        }
        Ok(())
    }

    /// Store a value directly, marking the key valid without the updater.
    pub fn set(&self, key: K, value: V) {
        self.find_or_create(key).set(value);
    }

    /// Remove one entry. Emits a `Removed` event carrying the entry's last
    /// value, after the manager lock is released, if the entry was valid.
    pub fn purge(&self, key: &K) {
        let removed = self.entries.write().remove(key);
        if let Some(entry) = removed {
            if let Some(value) = entry.flagged_value() {
                self.listeners.notify(&CacheEvent::Removed {
                    key: entry.key().clone(),
                    value,
                });
            }
        }
    }

    /// Replace the whole mapping with an empty one, then emit a single
    /// `Cleared` event after the lock is released.
    pub fn purge_all(&self) {
        let purged = {
            let mut entries = self.entries.write();
            let count = entries.len();
            *entries = HashMap::new();
            count
        };
        debug!(purged, "cache purged");
        self.listeners.notify(&CacheEvent::Cleared);
    }

    /// An independent copy of all currently valid key/value pairs. Entries
    /// that are invalid, TTL-expired, never populated, or mid-refresh are
    /// skipped.
    ///
    /// Entry handles are cloned under the read lock and the guard dropped
    /// before any entry state is read, and entry state is read without
    /// waiting, so a slow updater never stalls the map or this call.
    pub fn snapshot(&self) -> HashMap<K, V> {
        let entries: Vec<(K, Arc<CacheEntry<K, V>>)> = self
            .entries
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), Arc::clone(entry)))
            .collect();

        let mut snapshot = HashMap::with_capacity(entries.len());
        for (key, entry) in entries {
            if let Some(value) = entry.valid_value() {
                snapshot.insert(key, value);
            }
        }
        snapshot
    }

    /// Number of entries in the mapping, valid or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if no entry has been created yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Structural counters. Reads entry state the same way `snapshot` does:
    /// handles cloned first, no waiting on entry locks.
    pub fn stats(&self) -> CacheStats {
        let entries: Vec<Arc<CacheEntry<K, V>>> =
            self.entries.read().values().cloned().collect();
        CacheStats {
            total_entries: entries.len(),
            valid_entries: entries.iter().filter(|entry| entry.try_valid()).count(),
        }
    }
}
