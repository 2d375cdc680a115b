//! Derived metrics: CPL, hook/hold rate, CTR and fatigue classification.

use autopilot_core::{FatigueSeverity, PerformanceRecord};
use tracing::debug;

/// Frequency at which fatigue becomes `High`.
pub const HIGH_FATIGUE_FREQUENCY: f64 = 6.0;
/// Frequency at which fatigue becomes `Critical`.
pub const CRITICAL_FATIGUE_FREQUENCY: f64 = 8.0;
/// Default frequency threshold for the `ad_fatigue` flag.
pub const DEFAULT_FATIGUE_THRESHOLD: f64 = HIGH_FATIGUE_FREQUENCY;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator * scale`, or 0 when the denominator is empty.
fn safe_ratio(numerator: f64, denominator: f64, scale: f64) -> f64 {
    if denominator > 0.0 {
        round2((numerator / denominator * scale).max(0.0))
    } else {
        0.0
    }
}

/// Fill in `cpl`, `hook_rate`, `hold_rate` and `ctr` where their inputs exist.
///
/// Values already present on a record are kept, so running this twice is a
/// no-op the second time.
pub fn calculate_metrics(mut records: Vec<PerformanceRecord>) -> Vec<PerformanceRecord> {
    for record in records.iter_mut() {
        derive_metrics(record);
    }
    debug!(records = records.len(), "Derived metrics calculated");
    records
}

fn derive_metrics(record: &mut PerformanceRecord) {
    if record.cpl.is_none() {
        if let (Some(spend), Some(leads)) = (record.spend, record.leads) {
            record.cpl = Some(safe_ratio(spend, leads as f64, 1.0));
        }
    }
    if record.hook_rate.is_none() {
        if let (Some(plays), Some(impressions)) = (record.video_plays_3s, record.impressions) {
            record.hook_rate = Some(safe_ratio(plays as f64, impressions as f64, 100.0));
        }
    }
    if record.hold_rate.is_none() {
        if let (Some(thru), Some(plays)) = (record.thru_plays, record.video_plays_3s) {
            record.hold_rate = Some(safe_ratio(thru as f64, plays as f64, 100.0));
        }
    }
    if record.ctr.is_none() {
        if let (Some(clicks), Some(impressions)) = (record.clicks, record.impressions) {
            record.ctr = Some(safe_ratio(clicks as f64, impressions as f64, 100.0));
        }
    }
}

/// Severity band for a frequency value.
pub fn fatigue_severity(frequency: f64) -> FatigueSeverity {
    if frequency >= CRITICAL_FATIGUE_FREQUENCY {
        FatigueSeverity::Critical
    } else if frequency >= HIGH_FATIGUE_FREQUENCY {
        FatigueSeverity::High
    } else {
        FatigueSeverity::Normal
    }
}

/// Flag records whose frequency reached `threshold`.
///
/// Records without a frequency are marked not fatigued with an `Unknown`
/// severity rather than `Normal`.
pub fn detect_fatigue(mut records: Vec<PerformanceRecord>, threshold: f64) -> Vec<PerformanceRecord> {
    let mut fatigued = 0usize;
    for record in records.iter_mut() {
        match record.frequency {
            Some(frequency) => {
                let flag = frequency >= threshold;
                fatigued += usize::from(flag);
                record.ad_fatigue = Some(flag);
                record.fatigue_severity = Some(fatigue_severity(frequency));
            }
            None => {
                record.ad_fatigue = Some(false);
                record.fatigue_severity = Some(FatigueSeverity::Unknown);
            }
        }
    }
    debug!(records = records.len(), fatigued, threshold, "Fatigue detection complete");
    records
}
