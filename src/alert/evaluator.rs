use crate::alert::types::{AlertConfig, AlertEvent, AlertKind};
use crate::metrics::types::LoadRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Evaluates degradation rules over the trailing record window.
///
/// Each rule is checked independently on every pass; a kind that fired
/// within the cooldown is suppressed even while its condition persists,
/// which keeps a sustained outage from becoming an alert storm.
pub struct AlertEvaluator {
    config: AlertConfig,
    last_emitted: HashMap<AlertKind, DateTime<Utc>>,
}

impl AlertEvaluator {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            last_emitted: HashMap::new(),
        }
    }

    /// Run all rules over `window` (the trailing records, already capped by
    /// the caller) and return the alerts that cleared their cooldown.
    ///
    /// Fewer than `min_samples` records: no evaluation, no side effects.
    pub fn evaluate(&mut self, window: &[LoadRecord], now: DateTime<Utc>) -> Vec<AlertEvent> {
        if window.len() < self.config.min_samples {
            return Vec::new();
        }

        let total = window.len();
        let successes = window.iter().filter(|r| r.success).count();
        let success_rate = successes as f64 / total as f64;
        let failure_rate = (total - successes) as f64 / total as f64;
        let average_load_time_ms = if successes > 0 {
            window
                .iter()
                .filter(|r| r.success)
                .map(|r| r.load_time_ms)
                .sum::<f64>()
                / successes as f64
        } else {
            0.0
        };

        let mut emitted = Vec::new();

        if success_rate < self.config.min_success_rate {
            self.emit(
                AlertKind::LowSuccessRate,
                format!("Image load success rate dropped to {:.1}%", success_rate * 100.0),
                now,
                &mut emitted,
            );
        }

        if successes > 0 && average_load_time_ms > self.config.max_average_load_time_ms {
            self.emit(
                AlertKind::HighLoadTime,
                format!(
                    "Average image load time is {}ms",
                    average_load_time_ms.round() as i64
                ),
                now,
                &mut emitted,
            );
        }

        if failure_rate > self.config.max_failure_rate {
            self.emit(
                AlertKind::HighFailureRate,
                format!("Image load failure rate reached {:.1}%", failure_rate * 100.0),
                now,
                &mut emitted,
            );
        }

        emitted
    }

    fn emit(
        &mut self,
        kind: AlertKind,
        message: String,
        now: DateTime<Utc>,
        out: &mut Vec<AlertEvent>,
    ) {
        if let Some(last) = self.last_emitted.get(&kind) {
            let elapsed_ms = now.signed_duration_since(*last).num_milliseconds();
            if elapsed_ms < self.config.cooldown.as_millis() as i64 {
                return;
            }
        }

        self.last_emitted.insert(kind, now);
        tracing::warn!(kind = kind.as_str(), "{message}");
        out.push(AlertEvent {
            id: Uuid::new_v4(),
            kind,
            message,
            timestamp: now,
        });
    }
}
