//! Dependency-triggered invalidation
//!
//! Watches a list of external values (active account, active network, ...)
//! and flushes a cache namespace when any of them changes identity. The
//! comparison itself is framework-agnostic: the host calls
//! `check_and_invalidate` from whatever state-change notification mechanism
//! it has.

use std::sync::Arc;

use chainstash_cache::CacheManager;
use parking_lot::Mutex;
use tracing::debug;

/// Clears a [`CacheManager`]'s namespace when watched values change.
///
/// The first observation only seeds the baseline; clears happen on
/// subsequent changes, at most once per change. Unchanged observations are
/// no-ops.
pub struct DependencyWatcher<V> {
    manager: Arc<CacheManager>,
    previous: Mutex<Option<Vec<V>>>,
}

impl<V> DependencyWatcher<V>
where
    V: Clone + PartialEq,
{
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self {
            manager,
            previous: Mutex::new(None),
        }
    }

    /// Compare `current` against the last observation, clearing the cache on
    /// any difference. Returns whether a clear happened.
    pub fn check_and_invalidate(&self, current: &[V]) -> bool {
        let mut previous = self.previous.lock();
        match previous.as_deref() {
            None => {
                *previous = Some(current.to_vec());
                false
            }
            Some(seen) if seen == current => false,
            Some(_) => {
                *previous = Some(current.to_vec());
                debug!(
                    "watched dependencies changed, clearing {}",
                    self.manager.config().namespace
                );
                self.manager.clear();
                true
            }
        }
    }
}
