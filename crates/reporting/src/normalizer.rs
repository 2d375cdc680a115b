//! Upstream value normalization: turns the ads platform's mixed encodings
//! (plain numbers, numeric strings, action lists) into clean numbers, and
//! raw insight rows into `PerformanceRecord`s.

use autopilot_core::PerformanceRecord;
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// One upstream row as delivered by the ads platform.
pub type RawRow = Map<String, Value>;

/// Action kind carrying lead conversions.
pub const LEAD_ACTION: &str = "lead";
/// Action kind carrying video checkpoints (3s plays, thru-plays).
pub const VIDEO_VIEW_ACTION: &str = "video_view";

/// Coerce one upstream value into a float, falling back to `default`.
///
/// Action lists (`[{"action_type": "...", "value": "12"}]`) yield the first
/// element's `value`. Never fails.
pub fn normalize_numeric(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => match items.first() {
            Some(Value::Object(entry)) => entry.get("value").and_then(scalar_to_f64),
            _ => None,
        },
        Some(other) => scalar_to_f64(other),
    };
    parsed.unwrap_or(default)
}

/// Look up the value tagged `kind` in an upstream action list.
///
/// Returns `None` when the value is not a list or holds no entry of that kind.
pub fn action_value(value: Option<&Value>, kind: &str) -> Option<f64> {
    let Some(Value::Array(items)) = value else {
        return None;
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .find(|entry| entry.get("action_type").and_then(Value::as_str) == Some(kind))
        .map(|entry| entry.get("value").and_then(scalar_to_f64).unwrap_or(0.0))
}

fn scalar_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn to_count(value: f64) -> u64 {
    if value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn numeric_field(row: &RawRow, key: &str) -> Option<f64> {
    row.get(key).map(|v| normalize_numeric(Some(v), 0.0))
}

fn count_field(row: &RawRow, key: &str) -> Option<u64> {
    numeric_field(row, key).map(to_count)
}

/// Delivery fields the platform omits when they are zero.
fn zero_default_count(row: &RawRow, key: &str) -> Option<u64> {
    Some(count_field(row, key).unwrap_or(0))
}

/// Prefer a flat field; otherwise pull the tagged entry out of an action list.
fn count_or_action(row: &RawRow, key: &str, actions_key: &str, kind: &str) -> Option<u64> {
    count_field(row, key).or_else(|| action_value(row.get(actions_key), kind).map(to_count))
}

fn text_field(row: &RawRow, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Map one raw upstream row onto a record holding only normalized raw fields.
pub fn normalize_row(row: &RawRow) -> PerformanceRecord {
    let entity_id = text_field(row, &["campaign_id", "ad_id", "id"]).unwrap_or_default();
    let entity_name = text_field(row, &["campaign_name", "ad_name", "name"])
        .unwrap_or_else(|| "Unknown".to_string());
    let date_start = row
        .get("date_start")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    let cpl = numeric_field(row, "cpl")
        .or_else(|| action_value(row.get("cost_per_action_type"), LEAD_ACTION));

    PerformanceRecord {
        entity_id,
        entity_name,
        date_start,
        spend: Some(numeric_field(row, "spend").unwrap_or(0.0).max(0.0)),
        impressions: zero_default_count(row, "impressions"),
        reach: zero_default_count(row, "reach"),
        clicks: zero_default_count(row, "clicks"),
        frequency: numeric_field(row, "frequency").map(|v| v.max(0.0)),
        // No `lead` action means no conversions, not an unknown count.
        leads: Some(count_or_action(row, "leads", "actions", LEAD_ACTION).unwrap_or(0)),
        video_plays_3s: count_or_action(
            row,
            "video_plays_3s",
            "video_play_actions",
            VIDEO_VIEW_ACTION,
        ),
        thru_plays: count_or_action(
            row,
            "thru_plays",
            "video_thruplay_watched_actions",
            VIDEO_VIEW_ACTION,
        ),
        cpl,
        ..Default::default()
    }
}

/// Normalize a whole upstream batch, keeping row order.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<PerformanceRecord> {
    rows.iter().map(normalize_row).collect()
}
