//! # Ingest → aggregate → render pipeline
//!
//! - `engine` - per-message decode/validate/insert (`IngestEngine`)
//! - `ingestion` - the single-task control loop driving source, engine and renderer
//!
//! There is exactly one mutator of the store and one drawer of the chart:
//! the task running `ControlLoop::run`. No locks are involved.

pub mod engine;
pub mod ingestion;

pub use engine::{IngestEngine, ProcessError};
pub use ingestion::{ControlLoop, LoopReport, ShutdownReason};

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
};

/// Counters kept by the control loop, shown in the chart footer
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopStats {
    pub received: u64,
    pub inserted: u64,
    pub skipped: u64,
    pub render_failures: u64,
    pub last_insert: Option<DateTime<Utc>>,
}
