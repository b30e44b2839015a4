//! Error types for cachekit operations.

use thiserror::Error;

/// Boxed error returned by updaters, refreshers, initializers, and
/// pipeline handlers. Whatever the caller's code fails with is carried
/// through unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cache protocol errors.
///
/// The updater is the only source of failure in the cache core. Lookups,
/// sets, purges, and snapshots cannot fail; they either succeed or return
/// an absent/empty result.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The bound updater returned an error while refreshing a value.
    ///
    /// The failure is propagated verbatim and is never retried. The prior
    /// cached value and its validity are left untouched.
    #[error("refresh failed: {source}")]
    Refresh {
        #[source]
        source: BoxError,
    },

    /// A bulk refresh observed the cancellation signal between keys.
    #[error("refresh cancelled")]
    Cancelled,
}

impl CacheError {
    /// Wrap an updater failure.
    pub fn refresh(source: BoxError) -> Self {
        Self::Refresh { source }
    }

    /// Returns true if this error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
