use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Kind of sustained degradation an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowSuccessRate,
    HighLoadTime,
    HighFailureRate,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowSuccessRate => "low_success_rate",
            AlertKind::HighLoadTime => "high_load_time",
            AlertKind::HighFailureRate => "high_failure_rate",
        }
    }
}

/// A single emitted alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Thresholds and throttling for the alert pass.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Success rate below this emits `low_success_rate`.
    pub min_success_rate: f64,
    /// Average successful load time above this emits `high_load_time`.
    pub max_average_load_time_ms: f64,
    /// Failure rate above this emits `high_failure_rate`.
    pub max_failure_rate: f64,
    /// Minimum records in the window before any rule is evaluated.
    pub min_samples: usize,
    /// Per-kind re-emission floor.
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_success_rate: 0.85,
            max_average_load_time_ms: 3000.0,
            max_failure_rate: 0.15,
            min_samples: 10,
            cooldown: Duration::from_secs(300),
        }
    }
}
