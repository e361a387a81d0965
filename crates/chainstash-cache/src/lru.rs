//! Bounded recency store
//!
//! A thin wrapper over `lru::LruCache` fixing the key type to the physical
//! string keys used by the storage layer and exposing the delete/clear/keys
//! contract the backends need. Capacity is a hard bound: inserting a new key
//! at capacity evicts exactly one entry, the least recently accessed one.
//! Both reads and writes count as an access.

use std::num::NonZeroUsize;

/// Bounded key→value map with least-recently-used eviction
#[derive(Debug)]
pub struct LruStore<V> {
    inner: lru::LruCache<String, V>,
}

impl<V> LruStore<V> {
    /// Create a store holding at most `max_entries` values
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: lru::LruCache::new(capacity),
        }
    }

    /// Look up a value, refreshing its recency on hit
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.inner.get(key)
    }

    /// Insert or update a value, refreshing its recency.
    ///
    /// Updating an existing key never evicts. Inserting a new key at
    /// capacity evicts the least recently used entry first; the evicted key
    /// is returned so callers can log it.
    pub fn put(&mut self, key: String, value: V) -> Option<String> {
        match self.inner.push(key.clone(), value) {
            Some((old_key, _)) if old_key != key => Some(old_key),
            _ => None,
        }
    }

    /// Remove a key, reporting whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.pop(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Current keys, most recently used first. Diagnostic use only.
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|(key, _)| key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_put_and_get() {
        let mut store = LruStore::new(10);
        store.put("key1".to_string(), 1);
        assert_eq!(store.get("key1"), Some(&1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_capacity_limit() {
        let mut store = LruStore::new(3);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.put("c".to_string(), 3);
        assert_eq!(store.len(), 3);

        // fourth insert evicts the oldest key
        let evicted = store.put("d".to_string(), 4);
        assert_eq!(evicted, Some("a".to_string()));
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some(&2));
        assert_eq!(store.get("c"), Some(&3));
        assert_eq!(store.get("d"), Some(&4));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut store = LruStore::new(3);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.put("c".to_string(), 3);

        // touch "a" so "b" becomes the eviction victim
        store.get("a");
        let evicted = store.put("d".to_string(), 4);
        assert_eq!(evicted, Some("b".to_string()));
        assert_eq!(store.get("a"), Some(&1));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_update_existing_key_at_capacity_does_not_evict() {
        let mut store = LruStore::new(2);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);

        let evicted = store.put("a".to_string(), 10);
        assert_eq!(evicted, None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a"), Some(&10));
        assert_eq!(store.get("b"), Some(&2));
    }

    #[test]
    fn test_remove() {
        let mut store = LruStore::new(10);
        store.put("key".to_string(), 42);
        assert!(store.remove("key"));
        assert!(!store.remove("key"));
        assert_eq!(store.get("key"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = LruStore::new(10);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_most_recent_first() {
        let mut store = LruStore::new(3);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.get("a");
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_capacity_floor_is_one() {
        let mut store = LruStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        assert_eq!(store.len(), 1);
    }

    proptest! {
        // the bound holds for any interleaving of puts and gets
        #[test]
        fn prop_len_never_exceeds_capacity(
            capacity in 1usize..16,
            ops in prop::collection::vec((0u8..2, "[a-e]{1,2}"), 0..200),
        ) {
            let mut store = LruStore::new(capacity);
            for (op, key) in ops {
                match op {
                    0 => {
                        store.put(key, 0u32);
                    }
                    _ => {
                        store.get(&key);
                    }
                }
                prop_assert!(store.len() <= capacity);
            }
        }
    }
}
