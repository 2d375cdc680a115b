//! Assemble a fetched batch into the printable report.

use autopilot_core::{DateRange, EntityType, PerformanceRecord};
use autopilot_fetch::{BatchSource, FetchedBatch};
use autopilot_reporting::format::{cpl_band, format_currency, format_number, format_percentage, CplBand};
use autopilot_reporting::{
    default_columns, enrich, render_markdown_table, summary_stats, top_performers,
    underperformers, RankMetric, SummaryStats,
};
use serde::Serialize;

pub struct ReportOptions {
    pub fatigue_threshold: f64,
    pub rank_by: RankMetric,
    pub top_n: usize,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub entity: EntityType,
    pub range: DateRange,
    pub from_cache: bool,
    pub rank_by: RankMetric,
    pub records: Vec<PerformanceRecord>,
    pub summary: SummaryStats,
    pub top_performers: Vec<PerformanceRecord>,
    pub underperformers: Vec<PerformanceRecord>,
    #[serde(skip)]
    currency: String,
}

pub fn build_report(batch: FetchedBatch, options: &ReportOptions) -> Report {
    let records = enrich(batch.records, options.fatigue_threshold);
    let ascending = options.rank_by.lower_is_better();
    Report {
        entity: batch.entity,
        range: batch.range,
        from_cache: batch.source == BatchSource::Cache,
        rank_by: options.rank_by,
        summary: summary_stats(&records),
        top_performers: top_performers(&records, options.rank_by, options.top_n, ascending),
        underperformers: underperformers(&records, options.rank_by, options.top_n, ascending),
        records,
        currency: options.currency.clone(),
    }
}

fn push_stat(out: &mut Vec<String>, label: &str, value: Option<String>) {
    if let Some(value) = value {
        out.push(format!("- {label}: {value}"));
    }
}

fn ranked_lines(records: &[PerformanceRecord], metric: RankMetric) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| {
            metric
                .value(r)
                .map(|v| format!("- {} ({metric} {v:.2})", r.entity_name))
        })
        .collect()
}

impl Report {
    pub fn render_text(&self) -> String {
        let source = if self.from_cache { "cached" } else { "live" };
        let mut out = vec![format!("# {} report {} ({source})", self.entity, self.range), String::new()];

        if self.records.is_empty() {
            out.push("No data for this range.".to_string());
            return out.join("\n");
        }

        out.push(render_markdown_table(&self.records, default_columns(self.entity)));
        out.push(String::new());
        out.push("## Summary".to_string());

        let s = &self.summary;
        let currency = |v: f64| format_currency(v, &self.currency);
        push_stat(&mut out, "Total spend", s.total_spend.map(currency));
        push_stat(&mut out, "Total leads", s.total_leads.map(|v| format_number(v as f64, 0)));
        push_stat(
            &mut out,
            "Average CPL",
            s.avg_cpl.map(|v| {
                let band = match cpl_band(v) {
                    CplBand::Good => "good",
                    CplBand::Warning => "watch",
                    CplBand::Poor => "poor",
                };
                format!("{} ({band})", currency(v))
            }),
        );
        push_stat(&mut out, "Median CPL", s.median_cpl.map(currency));
        push_stat(&mut out, "Average frequency", s.avg_frequency.map(|v| format!("{v:.2}")));
        push_stat(&mut out, "Max frequency", s.max_frequency.map(|v| format!("{v:.2}")));
        push_stat(&mut out, "Average hook rate", s.avg_hook_rate.map(format_percentage));
        push_stat(&mut out, "Average hold rate", s.avg_hold_rate.map(format_percentage));

        let top = ranked_lines(&self.top_performers, self.rank_by);
        if !top.is_empty() {
            out.push(String::new());
            out.push(format!("## Top performers by {}", self.rank_by));
            out.extend(top);
        }
        let worst = ranked_lines(&self.underperformers, self.rank_by);
        if !worst.is_empty() {
            out.push(String::new());
            out.push(format!("## Underperformers by {}", self.rank_by));
            out.extend(worst);
        }

        let fatigued: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.ad_fatigue == Some(true))
            .map(|r| {
                let severity = r.fatigue_severity.map(|s| s.to_string()).unwrap_or_default();
                format!("- {} (frequency {:.2}, {severity})", r.entity_name, r.frequency.unwrap_or(0.0))
            })
            .collect();
        if !fatigued.is_empty() {
            out.push(String::new());
            out.push("## Fatigue warnings".to_string());
            out.extend(fatigued);
        }

        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn options() -> ReportOptions {
        ReportOptions {
            fatigue_threshold: 6.0,
            rank_by: RankMetric::Cpl,
            top_n: 2,
            currency: "€".to_string(),
        }
    }

    fn batch(records: Vec<PerformanceRecord>) -> FetchedBatch {
        FetchedBatch {
            entity: EntityType::Campaigns,
            range: DateRange {
                since: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                until: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            },
            records,
            source: BatchSource::Live,
        }
    }

    fn campaign(name: &str, spend: f64, leads: u64, frequency: f64) -> PerformanceRecord {
        PerformanceRecord {
            spend: Some(spend),
            leads: Some(leads),
            frequency: Some(frequency),
            ..PerformanceRecord::new(name, name)
        }
    }

    #[test]
    fn test_report_sections() {
        let report = build_report(
            batch(vec![
                campaign("Herbst Aktion 2024", 300.0, 40, 2.5),
                campaign("SUV Special", 640.0, 32, 6.8),
                campaign("Limousinen Deal", 210.0, 0, 1.2),
            ]),
            &options(),
        );
        assert_eq!(report.top_performers[0].entity_name, "Herbst Aktion 2024");
        assert_eq!(report.underperformers[0].entity_name, "SUV Special");

        let text = report.render_text();
        assert!(text.starts_with("# campaigns report 2025-01-01 - 2025-01-07 (live)"));
        assert!(text.contains("- Total spend: 1,150.00€"));
        assert!(text.contains("- Total leads: 72"));
        assert!(text.contains("## Top performers by cpl"));
        assert!(text.contains("- SUV Special (frequency 6.80, High)"));
        assert!(!text.contains("hook rate"));
    }

    #[test]
    fn test_empty_batch_is_neutral() {
        let report = build_report(batch(Vec::new()), &options());
        assert!(report.summary.is_empty());
        assert!(report.render_text().contains("No data for this range."));
    }

    #[test]
    fn test_json_report_omits_unknown_summary_fields() {
        let report = build_report(batch(vec![campaign("A", 10.0, 2, 1.0)]), &options());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entity"], "campaigns");
        assert_eq!(json["from_cache"], false);
        assert!(json["summary"].get("avg_hook_rate").is_none());
        assert_eq!(json["records"][0]["cpl"], 5.0);
    }
}
