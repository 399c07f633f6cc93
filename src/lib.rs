//! Image loading performance monitoring and error recovery.
//!
//! The crate tracks every attempted image fetch in a bounded in-memory
//! history, derives aggregate statistics on demand, raises throttled alerts
//! when load performance degrades, and tries to rescue failing image URLs
//! through a bounded sequence of rewrite-and-probe attempts.
//!
//! Everything is constructed explicitly: the [`MetricsRecorder`] is the
//! single shared context object, the [`Sink`] and [`UrlProbe`] seams are
//! injected capabilities with no-op / HTTP defaults.

pub mod alert;
pub mod metrics;
pub mod recovery;
pub mod sink;

pub use alert::{AlertConfig, AlertEvent, AlertKind};
pub use metrics::{
    DeviceClass, ErrorKind, ExportFormat, LoadEvent, LoadRecord, MetricsRecorder,
    PerformanceStats, ProblemImageSummary, RecorderConfig,
};
pub use recovery::{ErrorRecoveryStrategy, HttpProbe, RecoveryConfig, UrlProbe};
pub use sink::{NoopSink, Sink, SinkEvent, TracingSink};
