use crate::alert::AlertConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse classification of a failed image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Transport or CDN failure.
    Network,
    /// Malformed or disallowed URL.
    Validation,
    /// Image proxy / transform layer failure.
    Optimization,
    /// Anything unclassified.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Optimization => "optimization",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Viewport-width bucket attached to each record for segmented reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    /// Derive the class from a viewport width in CSS pixels.
    ///
    /// Mobile below 768, tablet below 1024, desktop otherwise. An unknown
    /// width classifies as desktop.
    pub fn from_viewport_width(width: Option<u32>) -> Self {
        match width {
            Some(w) if w < 768 => DeviceClass::Mobile,
            Some(w) if w < 1024 => DeviceClass::Tablet,
            _ => DeviceClass::Desktop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

/// One observation of an attempted image fetch.
///
/// Immutable after ingestion except for `retry_count` (recovery attempts
/// against an unresolved failure) and `resolved` (flips false to true when a
/// later success for the same URL is observed, never back).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRecord {
    pub url: String,
    /// Zero for failed loads.
    pub load_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Present only on failures.
    pub error_kind: Option<ErrorKind>,
    pub retry_count: u32,
    pub device_class: DeviceClass,
    pub resolved: bool,
    pub size_bytes: Option<u64>,
}

/// Ingestion parameters for a single load observation.
#[derive(Debug, Clone, Default)]
pub struct LoadEvent {
    pub url: String,
    pub load_time_ms: f64,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub retry_count: u32,
    pub size_bytes: Option<u64>,
    /// Caller-observed viewport width; `None` classifies as desktop.
    pub viewport_width: Option<u32>,
}

impl LoadEvent {
    pub fn new(url: impl Into<String>, load_time_ms: f64, success: bool) -> Self {
        Self {
            url: url.into(),
            load_time_ms,
            success,
            ..Default::default()
        }
    }

    /// Successful load with the observed duration.
    pub fn success(url: impl Into<String>, load_time_ms: f64) -> Self {
        Self::new(url, load_time_ms, true)
    }

    /// Failed load with its classification.
    pub fn failure(url: impl Into<String>, kind: ErrorKind) -> Self {
        let mut event = Self::new(url, 0.0, false);
        event.error_kind = Some(kind);
        event
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_viewport_width(mut self, width: u32) -> Self {
        self.viewport_width = Some(width);
        self
    }
}

/// Per-device-class slice of the aggregate statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total: usize,
    pub success_rate: f64,
    /// Average over successful loads of this class, zero when none.
    pub average_load_time_ms: f64,
}

/// Records bucketed into one hour-aligned slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesBucket {
    /// Bucket start, floored to the hour.
    pub bucket_start: DateTime<Utc>,
    pub total: usize,
    pub success_rate: f64,
    pub average_load_time_ms: f64,
}

/// Aggregate statistics over a trailing time window.
///
/// An empty window yields the canonical zero-valued object from
/// [`PerformanceStats::empty`]; aggregates never produce NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_images: usize,
    pub success_rate: f64,
    /// Mean over successful loads only.
    pub average_load_time_ms: f64,
    pub median_load_time_ms: f64,
    /// Nearest-rank (ceiling) 95th percentile of successful load times.
    pub p95_load_time_ms: f64,
    /// Top 10 successful records by descending load time.
    pub slowest_images: Vec<LoadRecord>,
    pub errors_by_type: BTreeMap<ErrorKind, usize>,
    pub performance_by_device: BTreeMap<DeviceClass, DeviceStats>,
    /// Hour-aligned buckets, ascending by bucket start.
    pub time_series: Vec<TimeSeriesBucket>,
}

impl PerformanceStats {
    /// Canonical zero-valued stats for an empty window.
    pub fn empty() -> Self {
        Self {
            total_images: 0,
            success_rate: 0.0,
            average_load_time_ms: 0.0,
            median_load_time_ms: 0.0,
            p95_load_time_ms: 0.0,
            slowest_images: Vec::new(),
            errors_by_type: BTreeMap::new(),
            performance_by_device: BTreeMap::new(),
            time_series: Vec::new(),
        }
    }
}

/// Per-URL summary included in the problem-image report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemImageSummary {
    pub url: String,
    pub failure_rate: f64,
    /// Average over successful loads of this URL, zero when none.
    pub average_load_time_ms: f64,
    pub total_requests: usize,
    pub last_error_kind: Option<ErrorKind>,
}

/// Recorder configuration.
///
/// Defaults carry the production constants: 10,000-record history, alert
/// pass over the trailing 100 records once 10 samples exist.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Maximum records retained; oldest evicted first.
    pub capacity: usize,
    /// Trailing record count the alert pass inspects.
    pub alert_window: usize,
    /// Maximum alert events retained.
    pub alert_capacity: usize,
    pub alerts: AlertConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            alert_window: 100,
            alert_capacity: 500,
            alerts: AlertConfig::default(),
        }
    }
}
