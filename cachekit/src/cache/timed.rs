//! Single-value timed cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cachekit_core::CacheError;
use parking_lot::RwLock;
use tracing::trace;

use super::updater::Refresher;

struct TimedState<V> {
    value: Option<V>,
    refreshed_at: Option<Instant>,
}

impl<V> TimedState<V> {
    fn is_fresh(&self, keep_alive: Duration) -> bool {
        match (&self.value, self.refreshed_at) {
            (Some(_), Some(at)) => at.elapsed() <= keep_alive,
            _ => false,
        }
    }
}

/// Degenerate form of the keyed cache holding exactly one value.
///
/// One shared lock, one timestamp, no per-entry decomposition. The
/// refresher runs while the lock is held, so concurrent callers of a stale
/// value resolve to a single refresh and the losers return the fresh result
/// without a second call.
pub struct TimedCache<V> {
    keep_alive: Duration,
    refresher: Arc<dyn Refresher<V>>,
    state: RwLock<TimedState<V>>,
    listeners: RwLock<Vec<Arc<dyn Fn(&V) + Send + Sync>>>,
}

impl<V: Clone> TimedCache<V> {
    /// Create a timed cache that treats a value as fresh for `keep_alive`
    /// after each successful refresh or explicit set.
    pub fn new<R>(keep_alive: Duration, refresher: R) -> Self
    where
        R: Refresher<V> + 'static,
    {
        Self {
            keep_alive,
            refresher: Arc::new(refresher),
            state: RwLock::new(TimedState {
                value: None,
                refreshed_at: None,
            }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Return the cached value, refreshing it first if it is stale or has
    /// never been populated. Refresh failures are propagated verbatim and
    /// leave the previous value and timestamp untouched.
    pub fn get(&self) -> Result<V, CacheError> {
        let mut state = self.state.write();
        if state.is_fresh(self.keep_alive) {
            if let Some(value) = &state.value {
                return Ok(value.clone());
            }
        }

        trace!("refreshing timed cache");
        let value = match self.refresher.refresh() {
            Ok(value) => value,
            Err(source) => return Err(CacheError::refresh(source)),
        };

        state.value = Some(value.clone());
        state.refreshed_at = Some(Instant::now());
        drop(state);

        self.notify(&value);
        Ok(value)
    }

    /// The last stored value, fresh or stale. Never refreshes.
    pub fn value(&self) -> Option<V> {
        self.state.read().value.clone()
    }

    /// True iff the cached value would be returned without a refresh.
    pub fn valid(&self) -> bool {
        self.state.read().is_fresh(self.keep_alive)
    }

    /// Reset the timestamp so the next `get` must refresh. The stale value
    /// stays readable through `value`.
    pub fn invalidate(&self) {
        self.state.write().refreshed_at = None;
    }

    /// Store a value directly and restart the TTL clock.
    pub fn set(&self, value: V) {
        let mut state = self.state.write();
        state.value = Some(value.clone());
        state.refreshed_at = Some(Instant::now());
        drop(state);

        self.notify(&value);
    }

    /// Register a listener invoked with every successfully refreshed or
    /// explicitly set value, outside the cache lock, in subscription order.
    pub fn subscribe<L>(&self, listener: L)
    where
        L: Fn(&V) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    fn notify(&self, value: &V) {
        let snapshot: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in snapshot {
            listener(value);
        }
    }
}
