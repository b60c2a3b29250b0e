//! Fixed-capacity least-recently-used cache.
//!
//! Backs the header-correlated context policy: each parallel test session
//! keeps its context in one entry, and the oldest untouched session is
//! evicted once the cache is full. The cache itself is not synchronised;
//! callers share it behind a mutex.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use crate::error::{MockServerError, Result};

/// A size-bounded map that evicts the least recently used entry.
pub struct LruCache<K, V> {
    inner: lru::LruCache<K, V>,
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.inner.cap())
            .field("len", &self.inner.len())
            .finish_non_exhaustive()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`MockServerError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(MockServerError::InvalidCapacity)?;
        Ok(Self {
            inner: lru::LruCache::new(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether `key` is cached, without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    /// Look up a value, marking it as the most recently used entry.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Insert or replace a value.
    ///
    /// The key always becomes the most recently used entry, even when it was
    /// already present. Inserting a new key into a full cache evicts the
    /// least recently used entry first; the evicted pair is returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            return None;
        }
        self.inner.push(key, value)
    }

    /// Remove an entry, leaving the recency of the others untouched.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.iter().map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, count: usize) -> LruCache<String, usize> {
        let mut cache = LruCache::new(capacity).unwrap();
        for i in 0..count {
            cache.set(format!("k{i}"), i);
        }
        cache
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = LruCache::<String, u8>::new(0);
        assert!(matches!(result, Err(MockServerError::InvalidCapacity)));
    }

    #[test]
    fn test_eleventh_key_evicts_first_inserted() {
        let mut cache = filled(10, 10);

        let evicted = cache.set("k10".to_string(), 10);

        assert_eq!(evicted, Some(("k0".to_string(), 0)));
        assert_eq!(cache.len(), 10);
        assert!(!cache.contains("k0"));
        assert!(cache.contains("k1"));
        assert!(cache.contains("k10"));
    }

    #[test]
    fn test_get_protects_key_from_eviction() {
        let mut cache = filled(10, 10);

        assert_eq!(cache.get("k0"), Some(&0));
        cache.set("k10".to_string(), 10);

        assert!(cache.contains("k0"));
        assert!(!cache.contains("k1"));
    }

    #[test]
    fn test_contains_does_not_refresh_recency() {
        let mut cache = filled(2, 2);

        assert!(cache.contains("k0"));
        cache.set("k2".to_string(), 2);

        assert!(!cache.contains("k0"));
    }

    #[test]
    fn test_set_existing_key_refreshes_recency() {
        let mut cache = filled(3, 3);

        assert_eq!(cache.set("k0".to_string(), 100), None);
        cache.set("k3".to_string(), 3);

        assert_eq!(cache.get("k0"), Some(&100));
        assert!(!cache.contains("k1"));
        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, vec!["k0", "k3", "k2"]);
    }

    #[test]
    fn test_delete_keeps_remaining_order() {
        let mut cache = filled(4, 4);

        assert_eq!(cache.delete("k2"), Some(2));
        assert_eq!(cache.delete("k2"), None);

        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, vec!["k3", "k1", "k0"]);

        cache.set("k4".to_string(), 4);
        cache.set("k5".to_string(), 5);
        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, vec!["k5", "k4", "k3", "k1"]);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut cache = filled(2, 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("k1"), None);

        cache.set("again".to_string(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_capacity_one() {
        let mut cache = filled(1, 1);
        let evicted = cache.set("k1".to_string(), 1);

        assert_eq!(evicted, Some(("k0".to_string(), 0)));
        assert_eq!(cache.keys().count(), 1);
        assert_eq!(cache.capacity(), 1);
    }
}
