//! Display helpers and the plain-text table handed to the summary writer.

use autopilot_core::{EntityType, PerformanceRecord};
use serde::{Deserialize, Serialize};

// ─── Number formatting ──────────────────────────────────────────────────────

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `value` with `decimals` places and `,` between thousands.
/// With zero decimals the value is truncated, not rounded.
pub fn format_number(value: f64, decimals: usize) -> String {
    let value = if decimals == 0 { value.trunc() } else { value };
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let sign = if value < 0.0 && raw.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{}.{frac}", group_thousands(int_part)),
        None => format!("{sign}{}", group_thousands(int_part)),
    }
}

/// `1,234.50€`
pub fn format_currency(value: f64, currency: &str) -> String {
    format!("{}{currency}", format_number(value, 2))
}

/// `12.3%` for a value already on the 0–100 scale.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

// ─── Trend & colour bands ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↗",
            Self::Down => "↘",
            Self::Flat => "→",
        }
    }
}

/// Direction and percentage change from `previous` to `current`,
/// rounded to one decimal. Changes under 1% are flat.
pub fn calculate_trend(current: f64, previous: f64) -> (TrendDirection, f64) {
    if previous == 0.0 {
        return (TrendDirection::Up, 0.0);
    }
    let change = (current - previous) / previous * 100.0;
    let direction = if change.abs() < 1.0 {
        TrendDirection::Flat
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    (direction, (change * 10.0).round() / 10.0)
}

/// Traffic-light band for a cost per lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CplBand {
    Good,
    Warning,
    Poor,
}

pub fn cpl_band(cpl: f64) -> CplBand {
    if cpl < 8.0 {
        CplBand::Good
    } else if cpl < 15.0 {
        CplBand::Warning
    } else {
        CplBand::Poor
    }
}

// ─── Tables ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Spend,
    Impressions,
    Leads,
    Cpl,
    Ctr,
    HookRate,
    HoldRate,
    Frequency,
    FatigueSeverity,
    PerformanceScore,
}

impl Column {
    fn header(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Spend => "spend",
            Self::Impressions => "impressions",
            Self::Leads => "leads",
            Self::Cpl => "cpl",
            Self::Ctr => "ctr",
            Self::HookRate => "hook_rate",
            Self::HoldRate => "hold_rate",
            Self::Frequency => "frequency",
            Self::FatigueSeverity => "fatigue",
            Self::PerformanceScore => "score",
        }
    }

    fn cell(&self, record: &PerformanceRecord) -> Option<String> {
        match self {
            Self::Name => Some(record.entity_name.replace('|', "/")),
            Self::Spend => record.spend.map(|v| format!("{v:.2}")),
            Self::Impressions => record.impressions.map(|v| v.to_string()),
            Self::Leads => record.leads.map(|v| v.to_string()),
            Self::Cpl => record.cpl.map(|v| format!("{v:.2}")),
            Self::Ctr => record.ctr.map(|v| format!("{v:.2}")),
            Self::HookRate => record.hook_rate.map(|v| format!("{v:.2}")),
            Self::HoldRate => record.hold_rate.map(|v| format!("{v:.2}")),
            Self::Frequency => record.frequency.map(|v| format!("{v:.2}")),
            Self::FatigueSeverity => record.fatigue_severity.map(|v| v.to_string()),
            Self::PerformanceScore => record.performance_score.map(|v| v.to_string()),
        }
    }
}

/// Columns shown for each entity level.
pub fn default_columns(entity: EntityType) -> &'static [Column] {
    match entity {
        EntityType::Campaigns => &[
            Column::Name,
            Column::Spend,
            Column::Leads,
            Column::Cpl,
            Column::Frequency,
        ],
        EntityType::Ads => &[
            Column::Name,
            Column::Spend,
            Column::Leads,
            Column::Cpl,
            Column::HookRate,
            Column::HoldRate,
            Column::Frequency,
        ],
    }
}

/// Render records as a markdown table. Missing values show as `-`.
/// Output depends only on the input, so identical batches render identically.
pub fn render_markdown_table(records: &[PerformanceRecord], columns: &[Column]) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| c.cell(record).unwrap_or_else(|| "-".to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.header().len()))
                .max()
                .unwrap_or(3)
                .max(3)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(columns.iter().map(|c| c.header()).collect()));
    out.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}
