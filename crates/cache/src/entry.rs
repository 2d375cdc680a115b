//! Persisted entry layout and key derivation.

use autopilot_core::{DateRange, EntityType, PerformanceRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached query result, stored as `{fetched_at, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub payload: Vec<PerformanceRecord>,
}

/// Key for an entity type over an absolute, inclusive date range.
///
/// Built from the resolved boundaries only, so "last 7 days" and an explicit
/// range covering the same dates share an entry.
pub fn cache_key(entity: EntityType, since: NaiveDate, until: NaiveDate) -> String {
    format!("{}_{}_{}", entity.as_str(), since.format("%Y-%m-%d"), until.format("%Y-%m-%d"))
}

pub fn range_key(entity: EntityType, range: &DateRange) -> String {
    cache_key(entity, range.since, range.until)
}

/// Split a key built by [`cache_key`] back into its parts. Anything else,
/// such as an export file sharing the directory, yields `None`.
pub fn parse_key(key: &str) -> Option<(EntityType, NaiveDate, NaiveDate)> {
    let mut parts = key.rsplitn(3, '_');
    let until = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let since = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let entity = parts.next()?.parse::<EntityType>().ok()?;
    Some((entity, since, until))
}

/// Keys double as file names; anything outside `[A-Za-z0-9_-]` is refused.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// An entry is stale once its age reaches `max_age`.
pub fn is_stale(fetched_at: DateTime<Utc>, max_age: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(max_age) {
        Ok(max_age) => now - fetched_at >= max_age,
        Err(_) => false,
    }
}
