//! weatherflow - live per-category averages of a weather observation stream
//!
//! ```text
//! StreamSource → Decoder → AggregationStore → Snapshot → ChartRenderer
//!                \_____________ ControlLoop (single task) ___________/
//! ```

pub mod config;
pub mod decoder;
pub mod pipeline;
pub mod source;
pub mod state;
pub mod ui;

pub use config::{Config, ConfigError, SourceKind};
pub use decoder::{DecodeError, Decoder, FieldMap, MessageError, Observation, ValidationError};
pub use pipeline::{ControlLoop, IngestEngine, LoopReport, LoopStats, ShutdownReason};
pub use source::{StreamError, StreamSource};
pub use state::{AggregationStore, CategoryMean, CategoryStats, Snapshot, StoreError};
pub use ui::{ChartOptions, ChartRenderer, ChartStyle, Render, RenderError};
