//! Fetch orchestration: resolve the date range, serve from the result
//! cache when fresh, otherwise pull live rows, normalize and cache them.

use crate::provider::RawRowProvider;
use crate::range::{resolve_range, today};
use autopilot_cache::{range_key, ResultCache};
use autopilot_core::{
    AppConfig, AutopilotError, AutopilotResult, DateRange, EntityType, PerformanceRecord,
};
use autopilot_reporting::normalize_rows;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a caller asks for.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub entity: EntityType,
    pub days: u32,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub force_refresh: bool,
    /// Overrides the orchestrator's default upstream timeout.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            days: 7,
            since: None,
            until: None,
            force_refresh: false,
            timeout: None,
        }
    }

    pub fn last_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn between(mut self, since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    Cache,
    Live,
}

/// Normalized records for a resolved range. Derived metrics are not filled
/// in; run the batch through the reporting crate for those.
#[derive(Debug, Clone)]
pub struct FetchedBatch {
    pub entity: EntityType,
    pub range: DateRange,
    pub records: Vec<PerformanceRecord>,
    pub source: BatchSource,
}

pub struct FetchOrchestrator {
    provider: Arc<dyn RawRowProvider>,
    cache: Arc<ResultCache>,
    max_age: Duration,
    timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(
        provider: Arc<dyn RawRowProvider>,
        cache: Arc<ResultCache>,
        max_age: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            max_age,
            timeout,
        }
    }

    pub fn from_config(
        provider: Arc<dyn RawRowProvider>,
        cache: Arc<ResultCache>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            provider,
            cache,
            Duration::from_secs(config.cache.ttl_secs),
            Duration::from_millis(config.fetch.timeout_ms),
        )
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Fetch relative to the caller's current date.
    pub async fn fetch(&self, request: &FetchRequest) -> AutopilotResult<FetchedBatch> {
        self.fetch_on(request, today()).await
    }

    /// Fetch with "today" pinned to `today`.
    pub async fn fetch_on(
        &self,
        request: &FetchRequest,
        today: NaiveDate,
    ) -> AutopilotResult<FetchedBatch> {
        let range = resolve_range(request.days, request.since, request.until, today)?;
        let key = range_key(request.entity, &range);

        if !request.force_refresh {
            if let Some(records) = self.cached(&key).await? {
                debug!(key = %key, records = records.len(), "Serving batch from cache");
                return Ok(FetchedBatch {
                    entity: request.entity,
                    range,
                    records,
                    source: BatchSource::Cache,
                });
            }
        }

        let records = self.fetch_live(request, range).await?;
        if let Err(e) = self.store(key.clone(), records.clone()).await {
            warn!(key = %key, error = %e, "Failed to cache fetched batch");
        }

        Ok(FetchedBatch {
            entity: request.entity,
            range,
            records,
            source: BatchSource::Live,
        })
    }

    // The file tier does blocking I/O; keep it off the async workers.
    async fn cached(&self, key: &str) -> AutopilotResult<Option<Vec<PerformanceRecord>>> {
        let cache = Arc::clone(&self.cache);
        let key = key.to_string();
        let max_age = self.max_age;
        tokio::task::spawn_blocking(move || cache.get(&key, max_age))
            .await
            .map_err(|e| AutopilotError::Internal(e.into()))
    }

    async fn store(&self, key: String, records: Vec<PerformanceRecord>) -> AutopilotResult<()> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.put(&key, &records))
            .await
            .map_err(|e| AutopilotError::Internal(e.into()))?
    }

    async fn fetch_live(
        &self,
        request: &FetchRequest,
        range: DateRange,
    ) -> AutopilotResult<Vec<PerformanceRecord>> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        info!(
            entity = %request.entity,
            %range,
            force_refresh = request.force_refresh,
            "Fetching live data from upstream"
        );

        let fetched =
            tokio::time::timeout(timeout, self.provider.fetch_raw(request.entity, range)).await;
        let rows = match fetched {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                metrics::counter!("fetch.failed").increment(1);
                error!(entity = %request.entity, %range, error = %e, "Upstream fetch failed");
                return Err(AutopilotError::UpstreamFetch {
                    entity: request.entity,
                    since: range.since,
                    until: range.until,
                    reason: format!("{e:#}"),
                });
            }
            Err(_) => {
                metrics::counter!("fetch.failed").increment(1);
                error!(entity = %request.entity, %range, ?timeout, "Upstream fetch timed out");
                return Err(AutopilotError::UpstreamTimeout {
                    entity: request.entity,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        metrics::counter!("fetch.live").increment(1);
        let records = normalize_rows(&rows);
        info!(entity = %request.entity, rows = records.len(), "Upstream fetch complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autopilot_reporting::RawRow;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    enum Behaviour {
        Rows(Vec<RawRow>),
        Fail(&'static str),
        Hang(Duration),
    }

    struct StubProvider {
        behaviour: Behaviour,
        calls: AtomicUsize,
        ranges: Mutex<Vec<DateRange>>,
    }

    impl StubProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
                ranges: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RawRowProvider for StubProvider {
        async fn fetch_raw(
            &self,
            _entity: EntityType,
            range: DateRange,
        ) -> anyhow::Result<Vec<RawRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ranges.lock().unwrap().push(range);
            match &self.behaviour {
                Behaviour::Rows(rows) => Ok(rows.clone()),
                Behaviour::Fail(msg) => Err(anyhow::anyhow!(*msg)),
                Behaviour::Hang(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn rows() -> Vec<RawRow> {
        [
            json!({"ad_id": "1", "ad_name": "SUV Video Hook Test A", "spend": "80", "leads": "10"}),
            json!({"ad_id": "2", "ad_name": "Kombi Special Offer", "spend": 100, "actions": [
                {"action_type": "lead", "value": "0"}
            ]}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn orchestrator(provider: Arc<StubProvider>) -> (FetchOrchestrator, TempDir) {
        let dir = tempdir().unwrap();
        let cache = Arc::new(ResultCache::new(dir.path(), 16));
        let orch = FetchOrchestrator::new(
            provider,
            cache,
            Duration::from_secs(3600),
            Duration::from_secs(5),
        );
        (orch, dir)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let provider = StubProvider::new(Behaviour::Rows(rows()));
        let (orch, _dir) = orchestrator(provider.clone());
        let request = FetchRequest::new(EntityType::Ads);

        let first = orch.fetch_on(&request, date("2025-01-07")).await.unwrap();
        assert_eq!(first.source, BatchSource::Live);
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[0].spend, Some(80.0));
        assert_eq!(first.records[1].leads, Some(0));
        assert_eq!(first.records[0].cpl, None);

        let second = orch.fetch_on(&request, date("2025-01-07")).await.unwrap();
        assert_eq!(second.source, BatchSource::Cache);
        assert_eq!(second.records, first.records);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_equivalent_requests_share_cache_entry() {
        let provider = StubProvider::new(Behaviour::Rows(rows()));
        let (orch, _dir) = orchestrator(provider.clone());

        let relative = FetchRequest::new(EntityType::Ads).last_days(7);
        let explicit = FetchRequest::new(EntityType::Ads)
            .between(Some(date("2025-01-01")), Some(date("2025-01-07")));
        let until_only = FetchRequest::new(EntityType::Ads)
            .last_days(7)
            .between(None, Some(date("2025-01-07")));

        orch.fetch_on(&relative, date("2025-01-07")).await.unwrap();
        let b = orch.fetch_on(&explicit, date("2025-03-15")).await.unwrap();
        let c = orch.fetch_on(&until_only, date("2025-02-01")).await.unwrap();

        assert_eq!(b.source, BatchSource::Cache);
        assert_eq!(c.source, BatchSource::Cache);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_range_ends_today_and_spans_days() {
        let provider = StubProvider::new(Behaviour::Rows(Vec::new()));
        let (orch, _dir) = orchestrator(provider.clone());

        let batch = orch
            .fetch(&FetchRequest::new(EntityType::Ads).last_days(7))
            .await
            .unwrap();
        assert_eq!(batch.range.until, today());
        assert_eq!(batch.range.num_days(), 7);
        assert_eq!(provider.ranges.lock().unwrap()[0], batch.range);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let provider = StubProvider::new(Behaviour::Rows(rows()));
        let (orch, _dir) = orchestrator(provider.clone());
        let request = FetchRequest::new(EntityType::Campaigns);

        orch.fetch_on(&request, date("2025-01-07")).await.unwrap();
        let refreshed = orch
            .fetch_on(&request.clone().force_refresh(true), date("2025-01-07"))
            .await
            .unwrap();
        assert_eq!(refreshed.source, BatchSource::Live);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cache_io_on_multi_thread_runtime() {
        let provider = StubProvider::new(Behaviour::Rows(rows()));
        let (orch, dir) = orchestrator(provider.clone());
        let request = FetchRequest::new(EntityType::Ads);

        orch.fetch_on(&request, date("2025-01-07")).await.unwrap();
        assert!(dir.path().join("ads_2025-01-01_2025-01-07.json").exists());

        let cached = orch.fetch_on(&request, date("2025-01-07")).await.unwrap();
        assert_eq!(cached.source, BatchSource::Cache);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let provider = StubProvider::new(Behaviour::Rows(Vec::new()));
        let (orch, _dir) = orchestrator(provider);

        let batch = orch
            .fetch_on(&FetchRequest::new(EntityType::Ads), date("2025-01-07"))
            .await
            .unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.source, BatchSource::Live);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_and_is_not_cached() {
        let provider = StubProvider::new(Behaviour::Fail("token expired"));
        let (orch, _dir) = orchestrator(provider.clone());
        let request = FetchRequest::new(EntityType::Ads);

        let err = orch.fetch_on(&request, date("2025-01-07")).await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("token expired"));

        let key = range_key(
            EntityType::Ads,
            &DateRange { since: date("2025-01-01"), until: date("2025-01-07") },
        );
        assert!(orch.cache().get(&key, Duration::from_secs(3600)).is_none());

        assert!(orch.fetch_on(&request, date("2025-01-07")).await.is_err());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_with_force_refresh_does_not_serve_stale_data() {
        let provider = StubProvider::new(Behaviour::Fail("rate limited"));
        let (orch, _dir) = orchestrator(provider);
        let key = range_key(
            EntityType::Ads,
            &DateRange { since: date("2025-01-01"), until: date("2025-01-07") },
        );
        orch.cache().put(&key, &[PerformanceRecord::new("old", "Old")]).unwrap();

        let request = FetchRequest::new(EntityType::Ads).force_refresh(true);
        let err = orch.fetch_on(&request, date("2025-01-07")).await.unwrap_err();
        assert!(matches!(err, AutopilotError::UpstreamFetch { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_failure() {
        let provider = StubProvider::new(Behaviour::Hang(Duration::from_secs(5)));
        let (orch, _dir) = orchestrator(provider);

        let request = FetchRequest::new(EntityType::Ads).with_timeout(Duration::from_millis(20));
        let err = orch.fetch_on(&request, date("2025-01-07")).await.unwrap_err();
        assert!(matches!(
            err,
            AutopilotError::UpstreamTimeout { timeout_ms: 20, .. }
        ));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn test_invalid_range_never_calls_upstream() {
        let provider = StubProvider::new(Behaviour::Rows(rows()));
        let (orch, _dir) = orchestrator(provider.clone());

        let err = orch
            .fetch_on(&FetchRequest::new(EntityType::Ads).last_days(0), date("2025-01-07"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutopilotError::InvalidRange(_)));
        assert_eq!(provider.calls(), 0);
    }
}
