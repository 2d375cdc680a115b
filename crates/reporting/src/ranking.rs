//! Top / bottom-N selection over a batch of records.

use autopilot_core::PerformanceRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A numeric field records can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Cpl,
    Ctr,
    HookRate,
    HoldRate,
    Spend,
    Leads,
    Frequency,
    PerformanceScore,
}

impl RankMetric {
    pub fn value(&self, record: &PerformanceRecord) -> Option<f64> {
        match self {
            Self::Cpl => record.cpl,
            Self::Ctr => record.ctr,
            Self::HookRate => record.hook_rate,
            Self::HoldRate => record.hold_rate,
            Self::Spend => record.spend,
            Self::Leads => record.leads.map(|v| v as f64),
            Self::Frequency => record.frequency,
            Self::PerformanceScore => record.performance_score.map(f64::from),
        }
    }

    /// Whether smaller values are the better ones (costs and frequency).
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Self::Cpl | Self::Frequency | Self::Spend)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpl => "cpl",
            Self::Ctr => "ctr",
            Self::HookRate => "hook_rate",
            Self::HoldRate => "hold_rate",
            Self::Spend => "spend",
            Self::Leads => "leads",
            Self::Frequency => "frequency",
            Self::PerformanceScore => "performance_score",
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric = match s.trim().to_ascii_lowercase().as_str() {
            "cpl" => Self::Cpl,
            "ctr" => Self::Ctr,
            "hook_rate" => Self::HookRate,
            "hold_rate" => Self::HoldRate,
            "spend" => Self::Spend,
            "leads" => Self::Leads,
            "frequency" => Self::Frequency,
            "performance_score" | "score" => Self::PerformanceScore,
            other => return Err(format!("unknown ranking metric '{other}'")),
        };
        Ok(metric)
    }
}

/// Pick `n` records by `metric`: the smallest values when `ascending`,
/// the largest otherwise.
///
/// Records whose metric is absent or `<= 0` carry no signal and are never
/// ranked. Equal values keep their input order.
pub fn top_performers(
    records: &[PerformanceRecord],
    metric: RankMetric,
    n: usize,
    ascending: bool,
) -> Vec<PerformanceRecord> {
    let mut candidates: Vec<(f64, &PerformanceRecord)> = records
        .iter()
        .filter_map(|record| {
            metric
                .value(record)
                .filter(|v| *v > 0.0)
                .map(|v| (v, record))
        })
        .collect();

    // Stable sort; NaN never gets past the `> 0` filter.
    candidates.sort_by(|(a, _), (b, _)| {
        let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    candidates
        .into_iter()
        .take(n)
        .map(|(_, record)| record.clone())
        .collect()
}

/// The worst `n` records under the same ordering sense as [`top_performers`].
pub fn underperformers(
    records: &[PerformanceRecord],
    metric: RankMetric,
    n: usize,
    ascending: bool,
) -> Vec<PerformanceRecord> {
    top_performers(records, metric, n, !ascending)
}
