//! In-process cache backed by DashMap for lock-free concurrent access.
//! Serves as L1 in front of the file store to skip disk reads and JSON
//! parsing on repeated requests.

use crate::entry::{is_stale, CacheEntry};
use autopilot_core::PerformanceRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Lock-free local cache of recently read or written entries.
pub struct LocalCache {
    store: DashMap<String, Arc<CacheEntry>>,
    max_entries: usize,
}

impl LocalCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: DashMap::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Payload for `key` if present and younger than `max_age` at `now`.
    /// Stale entries are dropped on the way out.
    pub fn get(
        &self,
        key: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<Vec<PerformanceRecord>> {
        let entry = self.store.get(key)?;
        if is_stale(entry.fetched_at, max_age, now) {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Insert or replace an entry.
    pub fn put(&self, key: String, entry: Arc<CacheEntry>) {
        // Over capacity: skip new keys, replacing existing ones is still fine.
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            return;
        }
        self.store.insert(key, entry);
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn entry(at: DateTime<Utc>) -> Arc<CacheEntry> {
        Arc::new(CacheEntry {
            fetched_at: at,
            payload: vec![PerformanceRecord::new("1", "SUV Special")],
        })
    }

    #[test]
    fn test_get_fresh_and_stale() {
        let cache = LocalCache::new(8);
        let t0 = Utc::now();
        cache.put("ads_a".to_string(), entry(t0));

        let hit = cache.get("ads_a", Duration::from_secs(60), t0 + ChronoDuration::seconds(59));
        assert_eq!(hit.unwrap().len(), 1);

        assert!(cache
            .get("ads_a", Duration::from_secs(60), t0 + ChronoDuration::seconds(60))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_skips_new_keys() {
        let cache = LocalCache::new(1);
        let t0 = Utc::now();
        cache.put("a".to_string(), entry(t0));
        cache.put("b".to_string(), entry(t0));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b", Duration::from_secs(60), t0).is_none());

        cache.put("a".to_string(), entry(t0 + ChronoDuration::seconds(5)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = LocalCache::new(4);
        cache.put("a".to_string(), entry(Utc::now()));
        cache.clear();
        assert!(cache.is_empty());
    }
}
