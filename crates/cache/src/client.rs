//! Result cache for fetched performance batches.
//! Two-tier caching: LocalCache (L1) -> FileStore (L2).

use crate::entry::{is_stale, is_valid_key, CacheEntry};
use crate::local::LocalCache;
use crate::store::FileStore;
use autopilot_core::config::CacheConfig;
use autopilot_core::{AutopilotError, AutopilotResult, PerformanceRecord};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// File-backed result cache with an in-process L1 layer.
pub struct ResultCache {
    store: FileStore,
    local: LocalCache,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>, l1_max_entries: usize) -> Self {
        Self {
            store: FileStore::new(dir),
            local: LocalCache::new(l1_max_entries),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        info!(dir = %config.dir, ttl_secs = config.ttl_secs, "Result cache initialized");
        Self::new(&config.dir, config.l1_max_entries)
    }

    /// Cached payload for `key` if younger than `max_age`.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<Vec<PerformanceRecord>> {
        self.get_at(key, max_age, Utc::now())
    }

    /// [`get`](Self::get) evaluated at an explicit instant.
    pub fn get_at(
        &self,
        key: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<Vec<PerformanceRecord>> {
        if !is_valid_key(key) {
            return None;
        }

        // L1 check
        if let Some(payload) = self.local.get(key, max_age, now) {
            metrics::counter!("cache.l1.hit").increment(1);
            debug!(key, "Result cache L1 hit");
            return Some(payload);
        }
        metrics::counter!("cache.l1.miss").increment(1);

        // L2 file check
        let entry = match self.store.read(key) {
            Some(entry) if !is_stale(entry.fetched_at, max_age, now) => entry,
            Some(entry) => {
                metrics::counter!("cache.file.miss").increment(1);
                debug!(key, fetched_at = %entry.fetched_at, "Result cache entry stale");
                return None;
            }
            None => {
                metrics::counter!("cache.file.miss").increment(1);
                debug!(key, "Result cache miss");
                return None;
            }
        };

        metrics::counter!("cache.file.hit").increment(1);
        debug!(key, records = entry.payload.len(), "Result cache file hit");
        let entry = Arc::new(entry);
        // Populate L1
        self.local.put(key.to_string(), entry.clone());
        Some(entry.payload.clone())
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub fn put(&self, key: &str, payload: &[PerformanceRecord]) -> AutopilotResult<()> {
        self.put_at(key, payload, Utc::now())
    }

    /// [`put`](Self::put) stamped with an explicit fetch time.
    pub fn put_at(
        &self,
        key: &str,
        payload: &[PerformanceRecord],
        fetched_at: DateTime<Utc>,
    ) -> AutopilotResult<()> {
        if !is_valid_key(key) {
            return Err(AutopilotError::Cache(format!("invalid cache key '{key}'")));
        }
        let entry = Arc::new(CacheEntry {
            fetched_at,
            payload: payload.to_vec(),
        });
        self.store.write(key, &entry)?;
        // Update L1
        self.local.put(key.to_string(), entry);

        metrics::counter!("cache.file.write").increment(1);
        info!(key, records = payload.len(), "Saved result to cache");
        Ok(())
    }

    /// Drop every cached entry, in memory and on disk.
    pub fn clear_all(&self) -> AutopilotResult<usize> {
        self.local.clear();
        let removed = self.store.clear()?;
        info!(removed, dir = %self.store.dir().display(), "Result cache cleared");
        Ok(removed)
    }

    pub fn local_cache_size(&self) -> usize {
        self.local.len()
    }
}
