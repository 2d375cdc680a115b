use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which level of the ads account a batch of rows describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Campaigns,
    Ads,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaigns => "campaigns",
            Self::Ads => "ads",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "campaigns" | "campaign" => Ok(Self::Campaigns),
            "ads" | "ad" => Ok(Self::Ads),
            other => Err(format!("unknown entity type '{other}' (expected campaigns or ads)")),
        }
    }
}

/// A resolved, inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.until - self.since).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date <= self.until
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.since, self.until)
    }
}

/// How severe the audience fatigue signal is for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FatigueSeverity {
    Normal,
    High,
    Critical,
    /// No frequency signal was available.
    Unknown,
}

impl fmt::Display for FatigueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "Normal",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// One observation of a campaign or ad over a date range.
///
/// Raw fields are filled by row normalization. Derived fields (`cpl` through
/// `performance_score`) are left empty until the metrics engine fills them,
/// and an upstream-supplied value is kept as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceRecord {
    pub entity_id: String,
    pub entity_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impressions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicks: Option<u64>,
    /// Impressions per reached person, as reported upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_plays_3s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thru_plays: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_fatigue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue_severity: Option<FatigueSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_score: Option<u8>,
}

impl PerformanceRecord {
    pub fn new(entity_id: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parse_and_display() {
        assert_eq!("ads".parse::<EntityType>().unwrap(), EntityType::Ads);
        assert_eq!(" Campaigns ".parse::<EntityType>().unwrap(), EntityType::Campaigns);
        assert!("adsets".parse::<EntityType>().is_err());
        assert_eq!(EntityType::Campaigns.to_string(), "campaigns");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange {
            since: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            until: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        };
        assert_eq!(range.num_days(), 7);
        assert!(range.contains(range.since));
        assert!(range.contains(range.until));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()));
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let mut record = PerformanceRecord::new("123", "SUV Video Hook Test A");
        record.spend = Some(80.0);
        record.leads = Some(10);

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("spend"));
        assert!(!obj.contains_key("cpl"));
        assert!(!obj.contains_key("video_plays_3s"));

        let back: PerformanceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
