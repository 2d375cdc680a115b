//! Ads performance reporting: value normalization, derived metrics,
//! fatigue classification, scoring, ranking and summaries.

pub mod aggregate;
pub mod format;
pub mod metrics;
pub mod normalizer;
pub mod ranking;
pub mod scoring;
pub mod summary;

pub use aggregate::{aggregate_by_period, Period, PeriodTotals};
pub use format::{default_columns, render_markdown_table, Column};
pub use metrics::{calculate_metrics, detect_fatigue, DEFAULT_FATIGUE_THRESHOLD};
pub use normalizer::{normalize_numeric, normalize_row, normalize_rows, RawRow};
pub use ranking::{top_performers, underperformers, RankMetric};
pub use scoring::{apply_scores, performance_score};
pub use summary::{summary_stats, SummaryStats};

use autopilot_core::PerformanceRecord;

/// Full derivation pass: metrics, fatigue, then score.
pub fn enrich(records: Vec<PerformanceRecord>, fatigue_threshold: f64) -> Vec<PerformanceRecord> {
    apply_scores(detect_fatigue(calculate_metrics(records), fatigue_threshold))
}
