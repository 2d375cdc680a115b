//! Batch-level summary statistics.

use crate::metrics::round2;
use autopilot_core::PerformanceRecord;
use serde::{Deserialize, Serialize};

/// Aggregates over a batch. A field is `None` when no record in the batch
/// carried its input, which callers must read as "unknown", not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_leads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_leads: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cpl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_cpl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hook_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hold_rate: Option<f64>,
}

impl SummaryStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn collect<F>(records: &[PerformanceRecord], field: F) -> Vec<f64>
where
    F: Fn(&PerformanceRecord) -> Option<f64>,
{
    records.iter().filter_map(field).collect()
}

fn sum(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| round2(values.iter().sum()))
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| round2(values.iter().sum::<f64>() / values.len() as f64))
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(round2(value))
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max).map(round2)
}

/// Totals, means and medians for whichever fields the batch carries.
pub fn summary_stats(records: &[PerformanceRecord]) -> SummaryStats {
    let spend = collect(records, |r| r.spend);
    let leads = collect(records, |r| r.leads.map(|v| v as f64));
    let cpl = collect(records, |r| r.cpl);
    let frequency = collect(records, |r| r.frequency);
    let hook_rate = collect(records, |r| r.hook_rate);
    let hold_rate = collect(records, |r| r.hold_rate);

    SummaryStats {
        total_spend: sum(&spend),
        avg_spend: mean(&spend),
        total_leads: (!leads.is_empty())
            .then(|| records.iter().filter_map(|r| r.leads).fold(0, u64::saturating_add)),
        avg_leads: mean(&leads),
        avg_cpl: mean(&cpl),
        median_cpl: median(&cpl),
        avg_frequency: mean(&frequency),
        max_frequency: max(&frequency),
        avg_hook_rate: mean(&hook_rate),
        avg_hold_rate: mean(&hold_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(spend: f64, leads: u64, cpl: f64, frequency: f64) -> PerformanceRecord {
        PerformanceRecord {
            spend: Some(spend),
            leads: Some(leads),
            cpl: Some(cpl),
            frequency: Some(frequency),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_batch_has_no_keys() {
        let stats = summary_stats(&[]);
        assert!(stats.is_empty());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_totals_and_averages() {
        let stats = summary_stats(&[
            rec(100.0, 10, 10.0, 2.0),
            rec(50.0, 5, 10.0, 4.0),
            rec(30.0, 10, 3.0, 7.5),
            rec(20.0, 0, 0.0, 1.0),
        ]);
        assert_eq!(stats.total_spend, Some(200.0));
        assert_eq!(stats.avg_spend, Some(50.0));
        assert_eq!(stats.total_leads, Some(25));
        assert_eq!(stats.avg_leads, Some(6.25));
        assert_eq!(stats.avg_cpl, Some(5.75));
        assert_eq!(stats.median_cpl, Some(6.5));
        assert_eq!(stats.avg_frequency, Some(3.63));
        assert_eq!(stats.max_frequency, Some(7.5));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let stats = summary_stats(&[PerformanceRecord {
            spend: Some(12.0),
            ..Default::default()
        }]);
        assert_eq!(stats.total_spend, Some(12.0));
        assert_eq!(stats.total_leads, None);
        assert_eq!(stats.avg_hook_rate, None);

        let json = serde_json::to_value(&stats).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("total_spend"));
        assert!(!obj.contains_key("avg_cpl"));
    }

    #[test]
    fn test_lead_total_saturates() {
        let stats = summary_stats(&[rec(1.0, u64::MAX, 0.0, 1.0), rec(1.0, u64::MAX, 0.0, 1.0)]);
        assert_eq!(stats.total_leads, Some(u64::MAX));
    }

    #[test]
    fn test_odd_median() {
        let stats = summary_stats(&[
            rec(1.0, 1, 9.0, 1.0),
            rec(1.0, 1, 3.0, 1.0),
            rec(1.0, 1, 4.0, 1.0),
        ]);
        assert_eq!(stats.median_cpl, Some(4.0));
    }
}
