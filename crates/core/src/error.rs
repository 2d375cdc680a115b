use crate::types::EntityType;
use chrono::NaiveDate;
use thiserror::Error;

pub type AutopilotResult<T> = Result<T, AutopilotError>;

#[derive(Error, Debug)]
pub enum AutopilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Upstream fetch failed for {entity} {since}..{until}: {reason}")]
    UpstreamFetch {
        entity: EntityType,
        since: NaiveDate,
        until: NaiveDate,
        reason: String,
    },

    #[error("Upstream fetch for {entity} timed out after {timeout_ms}ms")]
    UpstreamTimeout { entity: EntityType, timeout_ms: u64 },

    #[error("Result cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AutopilotError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl AutopilotError {
    /// True when no data is available because the upstream provider failed,
    /// as opposed to the provider legitimately returning nothing.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFetch { .. } | Self::UpstreamTimeout { .. }
        )
    }
}
