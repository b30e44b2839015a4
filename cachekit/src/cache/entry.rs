//! Per-key cache record.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cachekit_core::{CacheError, CacheEvent};
use parking_lot::Mutex;
use tracing::trace;

use super::notify::ListenerSet;
use super::updater::Updater;

/// One value slot with its own lock, validity flag, and refresh timestamp.
///
/// Entries are created lazily by
/// [`CacheManager::find_or_create`](super::CacheManager::find_or_create) and
/// handed out as `Arc`s; exactly one entry object ever exists per key. All
/// entry operations serialize on the entry's own lock, independent of the
/// manager's lock and of every other entry.
pub struct CacheEntry<K, V> {
    key: K,
    keep_alive: Option<Duration>,
    updater: Arc<dyn Updater<K, V>>,
    listeners: Arc<ListenerSet<K, V>>,
    state: Mutex<EntryState<V>>,
}

struct EntryState<V> {
    value: Option<V>,
    valid: bool,
    updated_at: Option<Instant>,
}

impl<V> EntryState<V> {
    /// Valid iff the flag is set and, when a TTL applies, the last update
    /// is younger than the TTL. Expiry is re-evaluated lazily on access;
    /// there is no timer and no explicit transition to invalid.
    fn is_valid(&self, keep_alive: Option<Duration>) -> bool {
        if !self.valid {
            return false;
        }
        match (keep_alive, self.updated_at) {
            (Some(ttl), Some(at)) => at.elapsed() < ttl,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl<K, V> CacheEntry<K, V>
where
    K: Clone,
    V: Clone,
{
    pub(crate) fn new(
        key: K,
        keep_alive: Option<Duration>,
        updater: Arc<dyn Updater<K, V>>,
        listeners: Arc<ListenerSet<K, V>>,
    ) -> Self {
        Self {
            key,
            keep_alive,
            updater,
            listeners,
            state: Mutex::new(EntryState {
                value: None,
                valid: false,
                updated_at: None,
            }),
        }
    }

    /// The key this entry was created for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// True iff the cached value is currently authoritative.
    pub fn valid(&self) -> bool {
        self.state.lock().is_valid(self.keep_alive)
    }

    /// The last stored value, valid or not. Never triggers a refresh.
    pub fn value(&self) -> Option<V> {
        self.state.lock().value.clone()
    }

    /// Clear the validity flag. The value is retained as last-known-good;
    /// the next `ensure` will contact the updater.
    pub fn invalidate(&self) {
        self.state.lock().valid = false;
    }

    /// Return the cached value, refreshing it first only if it is invalid
    /// or past its TTL.
    pub fn ensure(&self) -> Result<V, CacheError> {
        self.refresh(false)
    }

    /// Refresh unconditionally, ignoring validity and TTL.
    pub fn force(&self) -> Result<V, CacheError> {
        self.refresh(true)
    }

    /// Store a value directly, marking the entry valid without contacting
    /// the updater.
    pub fn set(&self, value: V) {
        let mut state = self.state.lock();
        state.value = Some(value.clone());
        state.valid = true;
        state.updated_at = Some(Instant::now());
        drop(state);

        self.listeners.notify(&CacheEvent::Updated {
            key: self.key.clone(),
            value,
        });
    }

    fn refresh(&self, force: bool) -> Result<V, CacheError> {
        let mut state = self.state.lock();

        if !force && state.is_valid(self.keep_alive) {
            if let Some(value) = &state.value {
                return Ok(value.clone());
            }
        }

        // The updater runs while the entry lock is held: two racing callers
        // for the same key resolve to a single updater call, the loser
        // blocks and then sees the fresh value. Slow updaters serialize all
        // callers of this one key; other keys are unaffected.
        trace!(forced = force, "refreshing cache entry");
        let value = match self.updater.update(&self.key) {
            Ok(value) => value,
            Err(source) => return Err(CacheError::refresh(source)),
        };

        state.value = Some(value.clone());
        state.valid = true;
        state.updated_at = Some(Instant::now());
        drop(state);

        self.listeners.notify(&CacheEvent::Updated {
            key: self.key.clone(),
            value: value.clone(),
        });
        Ok(value)
    }

    /// Last value if the validity flag is set, regardless of TTL. Used when
    /// purging to capture the value for the `Removed` event.
    pub(crate) fn flagged_value(&self) -> Option<V> {
        let state = self.state.lock();
        if state.valid {
            state.value.clone()
        } else {
            None
        }
    }

    /// Last value if the entry is fully valid (flag and TTL), read without
    /// waiting. An entry whose lock is held by an in-flight refresh reports
    /// `None`; its validity is in transition. Used by `snapshot`.
    pub(crate) fn valid_value(&self) -> Option<V> {
        let state = self.state.try_lock()?;
        if state.is_valid(self.keep_alive) {
            state.value.clone()
        } else {
            None
        }
    }

    /// Non-blocking form of [`valid`](Self::valid); an entry mid-refresh
    /// counts as not valid. Used by `stats`.
    pub(crate) fn try_valid(&self) -> bool {
        self.state
            .try_lock()
            .map_or(false, |state| state.is_valid(self.keep_alive))
    }
}
