//! Metrics facade instrumentation for load and recovery outcomes.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!("imagewatch_loads_total", "Total image load observations");
    describe_counter!(
        "imagewatch_load_failures_total",
        "Total failed image load observations"
    );
    describe_counter!(
        "imagewatch_alerts_total",
        "Total performance alerts emitted"
    );
    describe_counter!(
        "imagewatch_recovery_attempts_total",
        "Total URL recovery candidates probed"
    );
    describe_counter!(
        "imagewatch_recoveries_total",
        "Total successful URL recoveries"
    );

    describe_histogram!(
        "imagewatch_load_time_ms",
        "Successful image load time in milliseconds"
    );
}

/// Record a successful load observation
pub fn record_load_success(device: &str, load_time_ms: f64) {
    counter!("imagewatch_loads_total", "device" => device.to_string()).increment(1);
    histogram!("imagewatch_load_time_ms").record(load_time_ms);
}

/// Record a failed load observation
pub fn record_load_failure(device: &str, error: &str) {
    counter!("imagewatch_loads_total", "device" => device.to_string()).increment(1);
    counter!("imagewatch_load_failures_total", "device" => device.to_string(), "error" => error.to_string())
        .increment(1);
}

/// Record an alert emission
pub fn record_alert_emitted(kind: &str) {
    counter!("imagewatch_alerts_total", "kind" => kind.to_string()).increment(1);
}

/// Record a recovery candidate being probed
pub fn record_recovery_attempt(error: &str) {
    counter!("imagewatch_recovery_attempts_total", "error" => error.to_string()).increment(1);
}

/// Record a recovery producing a working URL
pub fn record_recovery_success(error: &str) {
    counter!("imagewatch_recoveries_total", "error" => error.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_recording_without_exporter() {
        // With no recorder installed these are no-ops and must not panic
        record_load_success("desktop", 120.0);
        record_load_failure("mobile", "network");
        record_alert_emitted("low_success_rate");
        record_recovery_attempt("validation");
        record_recovery_success("validation");
    }
}
