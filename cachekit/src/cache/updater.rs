//! Value-producing capabilities bound to caches.
//!
//! An [`Updater`] recomputes the value for a key; a [`Refresher`] does the
//! same for the single-value [`TimedCache`](super::TimedCache). Both are
//! blanket-implemented for closures, so a plain `Fn` works anywhere a
//! trait object is expected.

use cachekit_core::BoxError;

/// Recomputes the value for a key.
///
/// The cache calls this while holding the entry's lock, so at most one
/// update per key is ever in flight. Errors are propagated verbatim to the
/// caller of `get`/`update`; the cache never retries.
pub trait Updater<K, V>: Send + Sync {
    fn update(&self, key: &K) -> Result<V, BoxError>;
}

impl<K, V, F> Updater<K, V> for F
where
    F: Fn(&K) -> Result<V, BoxError> + Send + Sync,
{
    fn update(&self, key: &K) -> Result<V, BoxError> {
        self(key)
    }
}

/// Recomputes the single value of a [`TimedCache`](super::TimedCache).
pub trait Refresher<V>: Send + Sync {
    fn refresh(&self) -> Result<V, BoxError>;
}

impl<V, F> Refresher<V> for F
where
    F: Fn() -> Result<V, BoxError> + Send + Sync,
{
    fn refresh(&self) -> Result<V, BoxError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_updaters() {
        let double = |key: &u32| -> Result<u64, BoxError> { Ok(u64::from(*key) * 2) };
        assert_eq!(double.update(&21).unwrap(), 42);
    }

    #[test]
    fn closures_are_refreshers() {
        let answer = || -> Result<&'static str, BoxError> { Ok("fresh") };
        assert_eq!(answer.refresh().unwrap(), "fresh");
    }
}
