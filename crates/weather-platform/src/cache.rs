use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Per-series cache with a short TTL, keyed by whatever the caller finds
/// natural to key a market series on (city|date, usually). Entries older
/// than `ttl` are treated as absent rather than evicted eagerly -- the
/// next successful fetch overwrites them.
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, (Instant, V)>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        let (inserted_at, value) = entry.value().clone();
        if inserted_at.elapsed() <= self.ttl {
            Some(value)
        } else {
            None
        }
    }

    pub fn insert(&self, key: String, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("nyc|2026-07-27".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.get("nyc|2026-07-27"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_is_absent() {
        let cache = TtlCache::new(Duration::from_millis(0));
        cache.insert("k".to_string(), 42);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn missing_key_is_absent() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
    }
}
