//! Roll daily rows up into day / week / month buckets.

use autopilot_core::PerformanceRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    /// ISO weeks, starting Monday.
    Week,
    Month,
}

impl Period {
    /// First day of the bucket containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub period_start: NaiveDate,
    pub spend: f64,
    pub impressions: u64,
    pub leads: u64,
    pub clicks: u64,
}

/// Sum spend, impressions, leads and clicks per period, ordered by period.
/// Records without a `date_start` are skipped.
pub fn aggregate_by_period(records: &[PerformanceRecord], period: Period) -> Vec<PeriodTotals> {
    let mut buckets: BTreeMap<NaiveDate, PeriodTotals> = BTreeMap::new();
    for record in records {
        let Some(date) = record.date_start else {
            continue;
        };
        let start = period.bucket_start(date);
        let totals = buckets.entry(start).or_insert_with(|| PeriodTotals {
            period_start: start,
            spend: 0.0,
            impressions: 0,
            leads: 0,
            clicks: 0,
        });
        totals.spend += record.spend.unwrap_or(0.0);
        totals.impressions = totals.impressions.saturating_add(record.impressions.unwrap_or(0));
        totals.leads = totals.leads.saturating_add(record.leads.unwrap_or(0));
        totals.clicks = totals.clicks.saturating_add(record.clicks.unwrap_or(0));
    }
    buckets.into_values().collect()
}
