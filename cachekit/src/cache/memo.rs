//! Per-key memoizing map with caller-supplied initializers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use cachekit_core::{BoxError, CacheError};
use parking_lot::{Mutex, RwLock};

struct MemoSlot<V> {
    state: Mutex<MemoState<V>>,
}

struct MemoState<V> {
    value: Option<V>,
    valid: bool,
}

/// Keyed memoization without TTL or events: the initializer is supplied per
/// call instead of being bound at construction.
///
/// Slot creation uses the same double-checked locking as
/// [`CacheManager`](super::CacheManager), and the slot lock is held across
/// the initializer, so an initializer runs at most once per key unless the
/// key is invalidated or a previous attempt failed.
pub struct MemoMap<K, V> {
    slots: RwLock<HashMap<K, Arc<MemoSlot<V>>>>,
}

impl<K, V> MemoMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Return the memoized value for `key`, running `init` to produce it if
    /// the key is absent or invalid. Initializer failures propagate and
    /// leave the slot unpopulated, so a later call retries.
    pub fn get_or_init<F>(&self, key: K, init: F) -> Result<V, CacheError>
    where
        F: FnOnce(&K) -> Result<V, BoxError>,
    {
        let slot = self.find_or_create(&key);
        let mut state = slot.state.lock();

        if state.valid {
            if let Some(value) = &state.value {
                return Ok(value.clone());
            }
        }

        let value = init(&key).map_err(CacheError::refresh)?;
        state.value = Some(value.clone());
        state.valid = true;
        Ok(value)
    }

    /// The valid value for `key`, if any. Never initializes.
    pub fn peek(&self, key: &K) -> Option<V> {
        let slot = self.slots.read().get(key).cloned()?;
        let state = slot.state.lock();
        if state.valid {
            state.value.clone()
        } else {
            None
        }
    }

    /// Store a value directly, marking the key valid.
    pub fn set(&self, key: K, value: V) {
        let slot = self.find_or_create(&key);
        let mut state = slot.state.lock();
        state.value = Some(value);
        state.valid = true;
    }

    /// Clear the validity flag for `key`; the next `get_or_init` runs its
    /// initializer again. No-op for absent keys.
    pub fn invalidate(&self, key: &K) {
        if let Some(slot) = self.slots.read().get(key) {
            slot.state.lock().valid = false;
        }
    }

    /// Drop one key entirely.
    pub fn remove(&self, key: &K) {
        self.slots.write().remove(key);
    }

    /// Drop every key.
    pub fn clear(&self) {
        *self.slots.write() = HashMap::new();
    }

    /// An independent copy of all valid key/value pairs.
    pub fn snapshot(&self) -> HashMap<K, V> {
        let slots = self.slots.read();
        let mut snapshot = HashMap::with_capacity(slots.len());
        for (key, slot) in slots.iter() {
            let state = slot.state.lock();
            if state.valid {
                if let Some(value) = &state.value {
                    snapshot.insert(key.clone(), value.clone());
                }
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn find_or_create(&self, key: &K) -> Arc<MemoSlot<V>> {
        if let Some(slot) = self.slots.read().get(key) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write();
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }

        let slot = Arc::new(MemoSlot {
            state: Mutex::new(MemoState {
                value: None,
                valid: false,
            }),
        });
        slots.insert(key.clone(), Arc::clone(&slot));
        slot
    }
}

impl<K, V> Default for MemoMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn initializer_runs_once_per_key() {
        let map: MemoMap<u32, String> = MemoMap::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..5 {
            let value = map
                .get_or_init(7, |key| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(key.to_string())
                })
                .unwrap();
            assert_eq!(value, "7");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_initializer_is_retried() {
        let map: MemoMap<u32, u32> = MemoMap::new();

        let err = map
            .get_or_init(1, |_key| Err("first attempt".into()))
            .unwrap_err();
        assert!(err.to_string().contains("first attempt"));
        assert_eq!(map.peek(&1), None);

        assert_eq!(map.get_or_init(1, |key| Ok(key * 10)).unwrap(), 10);
    }

    #[test]
    fn invalidate_reruns_initializer() {
        let map: MemoMap<u32, u32> = MemoMap::new();
        assert_eq!(map.get_or_init(3, |_| Ok(1)).unwrap(), 1);

        map.invalidate(&3);
        assert_eq!(map.peek(&3), None);
        assert_eq!(map.get_or_init(3, |_| Ok(2)).unwrap(), 2);
    }

    #[test]
    fn set_bypasses_initializer() {
        let map: MemoMap<u32, u32> = MemoMap::new();
        map.set(5, 50);
        assert_eq!(
            map.get_or_init(5, |_| panic!("must not initialize")).unwrap(),
            50
        );
    }

    #[test]
    fn snapshot_skips_invalid_slots() {
        let map: MemoMap<u32, u32> = MemoMap::new();
        map.set(1, 10);
        map.set(2, 20);
        map.invalidate(&1);

        let snapshot = map.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&2), Some(&20));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn remove_and_clear_drop_slots() {
        let map: MemoMap<u32, u32> = MemoMap::new();
        map.set(1, 10);
        map.set(2, 20);

        map.remove(&1);
        assert_eq!(map.len(), 1);
        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn concurrent_get_or_init_runs_once() {
        let map: Arc<MemoMap<u32, u32>> = Arc::new(MemoMap::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                let runs = Arc::clone(&runs);
                thread::spawn(move || {
                    map.get_or_init(9, |key| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(key + 1)
                    })
                    .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 10);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
