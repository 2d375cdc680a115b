use crate::error::{AutopilotError, AutopilotResult};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADS_AUTOPILOT__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_max_entries")]
    pub l1_max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fatigue_threshold")]
    pub fatigue_threshold: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_days")]
    pub default_days: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

// Default functions
fn default_cache_dir() -> String {
    "data/cache".to_string()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_l1_max_entries() -> usize {
    256
}
fn default_fatigue_threshold() -> f64 {
    6.0
}
fn default_top_n() -> usize {
    3
}
fn default_currency_symbol() -> String {
    "€".to_string()
}
fn default_days() -> u32 {
    7
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_export_dir() -> String {
    "data/exports".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_secs: default_ttl_secs(),
            l1_max_entries: default_l1_max_entries(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fatigue_threshold: default_fatigue_threshold(),
            top_n: default_top_n(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            account_id: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
            fetch: FetchConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(file: Option<&str>) -> AutopilotResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("ADS_AUTOPILOT")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AutopilotResult<()> {
        if self.cache.ttl_secs == 0 {
            return Err(AutopilotError::Config(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.fetch.default_days == 0 {
            return Err(AutopilotError::Config(
                "fetch.default_days must be at least 1".to_string(),
            ));
        }
        check_fatigue_threshold(self.analysis.fatigue_threshold)?;
        Ok(())
    }
}

/// Accept a fatigue threshold only if it is a finite, non-negative frequency.
/// Shared by file/env loading and command-line overrides.
pub fn check_fatigue_threshold(value: f64) -> AutopilotResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AutopilotError::Config(format!(
            "fatigue threshold must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}
