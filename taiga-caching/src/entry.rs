//! Cache entry with access metadata

use std::time::{Duration, Instant};

/// Cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry was created
    pub created_at: Instant,

    /// When the entry expires
    pub expires_at: Instant,

    /// Number of times accessed
    pub access_count: u64,

    /// Last access time
    pub last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry with TTL
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Record an access
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
    }

    /// Get age of the entry
    pub fn age(&self) -> Duration {
        Instant::now() - self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry() {
        let entry = CacheEntry::with_ttl("value", Duration::from_secs(60));
        assert!(!entry.is_expired());

        let expired = CacheEntry::with_ttl("value", Duration::ZERO);
        assert!(expired.is_expired());
    }

    #[test]
    fn test_record_access() {
        let mut entry = CacheEntry::with_ttl(42, Duration::from_secs(60));
        let before = entry.last_accessed;
        entry.record_access();
        assert_eq!(entry.access_count, 1);
        assert!(entry.last_accessed >= before);
    }
}
