//! Load event recording and aggregate statistics
//!
//! Maintains a bounded FIFO history of image load observations and derives
//! reporting views over trailing time windows:
//! - Success rate, average/median/p95 load times
//! - Per-device and per-error breakdowns
//! - Hourly time series
//! - Problem-image report (high failure rate or slow URLs)

pub mod error;
pub mod export;
pub mod recorder;
pub mod telemetry;
pub mod types;

pub use error::{MetricsError, MetricsResult};
pub use export::ExportFormat;
pub use recorder::MetricsRecorder;
pub use types::{
    DeviceClass, DeviceStats, ErrorKind, LoadEvent, LoadRecord, PerformanceStats,
    ProblemImageSummary, RecorderConfig, TimeSeriesBucket,
};
