//! Upstream raw-row providers.

use anyhow::Context;
use async_trait::async_trait;
use autopilot_core::{DateRange, EntityType};
use autopilot_reporting::RawRow;
use chrono::NaiveDate;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Source of raw insight rows for one entity level over a date range.
///
/// Rows may miss fields, use nested action lists and arrive in any order.
#[async_trait]
pub trait RawRowProvider: Send + Sync {
    async fn fetch_raw(&self, entity: EntityType, range: DateRange) -> anyhow::Result<Vec<RawRow>>;
}

/// Reads rows exported from the ads platform as `<dir>/<entity>.json`,
/// a JSON array of insight rows.
pub struct ExportDirProvider {
    dir: PathBuf,
}

impl ExportDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn row_in_range(row: &RawRow, range: &DateRange) -> bool {
    // Undated rows are already aggregated over the export window.
    match row.get("date_start").and_then(Value::as_str) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| range.contains(date))
            .unwrap_or(true),
        None => true,
    }
}

#[async_trait]
impl RawRowProvider for ExportDirProvider {
    async fn fetch_raw(&self, entity: EntityType, range: DateRange) -> anyhow::Result<Vec<RawRow>> {
        let path = self.dir.join(format!("{}.json", entity.as_str()));
        let raw = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read export {}", path.display()))?;
        let value: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("export {} is not valid JSON", path.display()))?;
        let Value::Array(items) = value else {
            anyhow::bail!("export {} must be a JSON array of rows", path.display());
        };

        let total = items.len();
        let rows: Vec<RawRow> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .filter(|row| row_in_range(row, &range))
            .collect();

        debug!(entity = %entity, total, kept = rows.len(), %range, "Export rows loaded");
        Ok(rows)
    }
}
