//! Listener registry shared between a manager and its entries.

use std::sync::Arc;

use cachekit_core::CacheEvent;
use parking_lot::RwLock;

/// A registered event listener.
pub type Listener<K, V> = Arc<dyn Fn(&CacheEvent<K, V>) + Send + Sync>;

/// Ordered, append-only set of listeners.
///
/// The set is shared by `Arc` between the manager and every entry it
/// creates, so entries can emit events without holding a back-reference to
/// the manager. There is no unsubscribe; listeners live as long as the
/// cache that owns them.
pub struct ListenerSet<K, V> {
    listeners: RwLock<Vec<Listener<K, V>>>,
}

impl<K, V> ListenerSet<K, V> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Append a listener. Listeners are invoked in subscription order.
    pub fn subscribe(&self, listener: Listener<K, V>) {
        self.listeners.write().push(listener);
    }

    /// Invoke every listener synchronously on the current thread.
    ///
    /// The list is snapshotted first so no lock is held during the
    /// callbacks; a listener may re-enter the cache (or subscribe another
    /// listener) without deadlocking.
    pub fn notify(&self, event: &CacheEvent<K, V>) {
        let snapshot: Vec<Listener<K, V>> = self.listeners.read().iter().cloned().collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// True if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl<K, V> Default for ListenerSet<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
