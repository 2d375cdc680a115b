//! Fetch orchestration between the upstream ads platform, the result cache
//! and the reporting pipeline.

pub mod orchestrator;
pub mod provider;
pub mod range;

pub use orchestrator::{BatchSource, FetchOrchestrator, FetchRequest, FetchedBatch};
pub use provider::{ExportDirProvider, RawRowProvider};
pub use range::{resolve_range, today};
