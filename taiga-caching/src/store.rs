//! Bounded TTL store with LRU eviction and pattern invalidation

use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    entry::CacheEntry,
    stats::{create_stats_collector, SharedStatsCollector},
    CacheResult, CacheStats,
};

/// Bounded in-memory cache keyed by string fingerprints.
///
/// Entries expire on access once their TTL elapses; inserting at capacity
/// evicts the least-recently-accessed entry first. All map mutations happen
/// under one exclusive lock, counters are atomic.
pub struct MemoryCache<V> {
    /// Maximum number of entries
    max_entries: usize,

    /// Default TTL for entries
    default_ttl: Duration,

    /// Store with entries
    store: Mutex<HashMap<String, CacheEntry<V>>>,

    /// Statistics collector
    stats: SharedStatsCollector,
}

impl<V: Clone> MemoryCache<V> {
    /// Create a new cache with the given capacity and default TTL
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        assert!(max_entries > 0, "cache capacity must be greater than 0");
        Self {
            max_entries,
            default_ttl,
            store: Mutex::new(HashMap::with_capacity(max_entries)),
            stats: create_stats_collector(),
        }
    }

    /// Get a value from the cache
    ///
    /// Expired entries are removed and reported as misses. A hit refreshes
    /// the entry's last-access time.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock();
        match store.get_mut(key) {
            Some(entry) => {
                if entry.is_expired() {
                    store.remove(key);
                    self.stats.record_eviction();
                    self.stats.record_miss();
                    None
                } else {
                    entry.record_access();
                    self.stats.record_hit();
                    Some(entry.value.clone())
                }
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert a value with the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Insert a value with an explicit TTL
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut store = self.store.lock();

        // Overwrites never need eviction
        if !store.contains_key(&key) && store.len() >= self.max_entries {
            self.evict_lru(&mut store);
        }

        store.insert(key, CacheEntry::with_ttl(value, ttl));
    }

    /// Remove a single entry
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock();
        store.remove(key).and_then(|entry| {
            if entry.is_expired() {
                self.stats.record_eviction();
                None
            } else {
                Some(entry.value)
            }
        })
    }

    /// Remove all keys matching the given regex, returning the removed count
    pub fn invalidate(&self, pattern: &str) -> CacheResult<usize> {
        let re = Regex::new(pattern)?;
        let mut store = self.store.lock();

        let matching: Vec<String> = store.keys().filter(|k| re.is_match(k)).cloned().collect();

        for key in &matching {
            store.remove(key);
        }

        self.stats.record_evictions(matching.len() as u64);
        Ok(matching.len())
    }

    /// Remove all entries, returning the removed count
    pub fn clear(&self) -> usize {
        let mut store = self.store.lock();
        let count = store.len();
        store.clear();
        self.stats.record_evictions(count as u64);
        count
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let store = self.store.lock();
        store.values().filter(|entry| !entry.is_expired()).count()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.get_stats(self.len())
    }

    /// Drop the least-recently-accessed entry. Caller holds the lock.
    fn evict_lru(&self, store: &mut HashMap<String, CacheEntry<V>>) {
        let victim = store
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            store.remove(&key);
            self.stats.record_eviction();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MemoryCache<String> {
        MemoryCache::new(3, Duration::from_secs(60))
    }

    #[test]
    fn test_set_get_roundtrip() {
        let cache = cache();
        cache.set("projects|/|project=7", "value".to_string());
        assert_eq!(cache.get("projects|/|project=7"), Some("value".to_string()));
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = MemoryCache::new(10, Duration::from_millis(20));
        cache.set("key1", 1);

        assert_eq!(cache.get("key1"), Some(1));

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("key1"), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_custom_ttl() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set_with_ttl("short", 1, Duration::from_millis(20));
        cache.set("long", 2);

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache();
        cache.set("a", "1".to_string());
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", "2".to_string());
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c", "3".to_string());
        std::thread::sleep(Duration::from_millis(2));

        // Touch 'a' so 'b' becomes the LRU victim
        assert!(cache.get("a").is_some());
        std::thread::sleep(Duration::from_millis(2));

        cache.set("d", "4".to_string());

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
        assert!(cache.len() <= 3);
    }

    #[test]
    fn test_size_bound_holds() {
        let cache = MemoryCache::new(5, Duration::from_secs(60));
        for i in 0..50 {
            cache.set(format!("key-{}", i), i);
            assert!(cache.len() <= 5);
        }
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = cache();
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.set("c", "3".to_string());
        cache.set("a", "updated".to_string());

        assert_eq!(cache.get("a"), Some("updated".to_string()));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_invalidate_pattern() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set("projects|/7|project=7", 1);
        cache.set("projects|/7/stats|project=7", 2);
        cache.set("projects|/8|project=8", 3);

        let removed = cache.invalidate("project=7$").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("projects|/7|project=7"), None);
        assert_eq!(cache.get("projects|/8|project=8"), Some(3));
    }

    #[test]
    fn test_invalidate_idempotent() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set("key-1", 1);

        assert_eq!(cache.invalidate("key-.*").unwrap(), 1);
        assert_eq!(cache.invalidate("key-.*").unwrap(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let cache = cache();
        assert!(cache.invalidate("[unclosed").is_err());
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_stats_hit_rate() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set("a", 1);

        cache.get("a");
        cache.get("a");
        cache.get("missing");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.total_gets, 4);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
