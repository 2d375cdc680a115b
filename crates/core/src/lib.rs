pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AutopilotError, AutopilotResult};
pub use types::{DateRange, EntityType, FatigueSeverity, PerformanceRecord};
