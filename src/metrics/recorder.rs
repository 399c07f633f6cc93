use crate::alert::{AlertEvaluator, AlertEvent};
use crate::metrics::error::MetricsResult;
use crate::metrics::export::{self, ExportFormat};
use crate::metrics::telemetry;
use crate::metrics::types::{
    DeviceClass, DeviceStats, ErrorKind, LoadEvent, LoadRecord, PerformanceStats,
    ProblemImageSummary, RecorderConfig, TimeSeriesBucket,
};
use crate::sink::{NoopSink, Sink, SinkEvent};
use chrono::{DateTime, Duration, Timelike, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// Shared context object for load observation and reporting.
///
/// All buffer mutation happens behind one lock so concurrent callers see a
/// linearized insert order. Query methods take read access only and are safe
/// to call at any time without affecting ingestion.
pub struct MetricsRecorder {
    config: RecorderConfig,
    sink: Arc<dyn Sink>,
    inner: RwLock<RecorderState>,
}

struct RecorderState {
    records: VecDeque<LoadRecord>,
    alerts: VecDeque<AlertEvent>,
    evaluator: AlertEvaluator,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::with_config(RecorderConfig::default())
    }

    pub fn with_config(config: RecorderConfig) -> Self {
        Self::with_sink(config, Arc::new(NoopSink))
    }

    /// Recorder forwarding every record and alert to `sink` best-effort.
    pub fn with_sink(config: RecorderConfig, sink: Arc<dyn Sink>) -> Self {
        telemetry::init_metrics();
        let evaluator = AlertEvaluator::new(config.alerts.clone());
        Self {
            config,
            sink,
            inner: RwLock::new(RecorderState {
                records: VecDeque::new(),
                alerts: VecDeque::new(),
                evaluator,
            }),
        }
    }

    /// Ingest one load observation stamped with the current time.
    pub fn record_load(&self, event: LoadEvent) {
        self.record_load_at(event, Utc::now());
    }

    /// Ingest one load observation with an explicit timestamp.
    ///
    /// Timestamps are assumed non-decreasing in insertion order; this entry
    /// point exists for backfill and deterministic tests (wall-clock callers
    /// use [`MetricsRecorder::record_load`]).
    pub fn record_load_at(&self, event: LoadEvent, timestamp: DateTime<Utc>) {
        let record = LoadRecord {
            url: event.url,
            load_time_ms: if event.success {
                // NaN and negative durations degrade to zero
                event.load_time_ms.max(0.0)
            } else {
                0.0
            },
            timestamp,
            success: event.success,
            error_kind: if event.success {
                None
            } else {
                Some(event.error_kind.unwrap_or(ErrorKind::Unknown))
            },
            retry_count: event.retry_count,
            device_class: DeviceClass::from_viewport_width(event.viewport_width),
            resolved: false,
            size_bytes: event.size_bytes,
        };

        match record.error_kind {
            None => telemetry::record_load_success(record.device_class.as_str(), record.load_time_ms),
            Some(kind) => telemetry::record_load_failure(record.device_class.as_str(), kind.as_str()),
        }

        let emitted = {
            let mut guard = self.inner.write();
            let state = &mut *guard;

            state.records.push_back(record.clone());
            while state.records.len() > self.config.capacity {
                state.records.pop_front();
            }

            let start = state.records.len().saturating_sub(self.config.alert_window);
            let window = &state.records.make_contiguous()[start..];
            let emitted = state.evaluator.evaluate(window, timestamp);

            for alert in &emitted {
                state.alerts.push_back(alert.clone());
            }
            while state.alerts.len() > self.config.alert_capacity {
                state.alerts.pop_front();
            }
            emitted
        };

        // Sink delivery is best-effort; observability must never destabilize
        // the ingestion path.
        if let Err(err) = self.sink.send(SinkEvent::Load(record)) {
            tracing::debug!(%err, "sink rejected load event");
        }
        for alert in emitted {
            telemetry::record_alert_emitted(alert.kind.as_str());
            if let Err(err) = self.sink.send(SinkEvent::Alert(alert)) {
                tracing::debug!(%err, "sink rejected alert event");
            }
        }
    }

    /// Record a successful load and mark earlier unresolved failures for the
    /// same URL as resolved.
    pub fn record_success(&self, url: &str, load_time_ms: Option<f64>) {
        self.record_success_at(url, load_time_ms, Utc::now());
    }

    /// Timestamped variant of [`MetricsRecorder::record_success`].
    pub fn record_success_at(
        &self,
        url: &str,
        load_time_ms: Option<f64>,
        timestamp: DateTime<Utc>,
    ) {
        {
            let mut guard = self.inner.write();
            for record in guard
                .records
                .iter_mut()
                .filter(|r| !r.success && !r.resolved && r.url == url)
            {
                record.resolved = true;
            }
        }
        self.record_load_at(
            LoadEvent::success(url, load_time_ms.unwrap_or(0.0)),
            timestamp,
        );
    }

    /// Increment the retry count on unresolved failure records for `url`.
    pub(crate) fn mark_retry(&self, url: &str) {
        let mut guard = self.inner.write();
        for record in guard
            .records
            .iter_mut()
            .filter(|r| !r.success && !r.resolved && r.url == url)
        {
            record.retry_count += 1;
        }
    }

    /// Aggregate statistics over the trailing `window_hours` hours.
    pub fn get_stats(&self, window_hours: u32) -> PerformanceStats {
        let cutoff = Utc::now() - Duration::hours(window_hours as i64);
        let guard = self.inner.read();
        let window: Vec<&LoadRecord> = guard
            .records
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .collect();

        if window.is_empty() {
            return PerformanceStats::empty();
        }

        let total = window.len();
        let successes: Vec<&LoadRecord> = window.iter().copied().filter(|r| r.success).collect();

        let mut times: Vec<f64> = successes.iter().map(|r| r.load_time_ms).collect();
        times.sort_by(f64::total_cmp);

        let mut slowest: Vec<LoadRecord> = successes.iter().map(|&r| r.clone()).collect();
        slowest.sort_by(|a, b| b.load_time_ms.total_cmp(&a.load_time_ms));
        slowest.truncate(10);

        let mut errors_by_type: BTreeMap<ErrorKind, usize> = BTreeMap::new();
        for record in window.iter().filter(|r| !r.success) {
            *errors_by_type
                .entry(record.error_kind.unwrap_or(ErrorKind::Unknown))
                .or_insert(0) += 1;
        }

        PerformanceStats {
            total_images: total,
            success_rate: successes.len() as f64 / total as f64,
            average_load_time_ms: mean(&times),
            median_load_time_ms: median(&times),
            p95_load_time_ms: percentile_nearest_rank(&times, 0.95),
            slowest_images: slowest,
            errors_by_type,
            performance_by_device: device_breakdown(&window),
            time_series: time_series(&window),
        }
    }

    /// Per-URL problem report over the trailing `window_hours` hours.
    ///
    /// A URL is included once it has at least 5 requests and either more
    /// than 10% failures or an average successful load above 2 seconds.
    /// Sorted by descending failure rate.
    pub fn get_problematic_images(&self, window_hours: u32) -> Vec<ProblemImageSummary> {
        let cutoff = Utc::now() - Duration::hours(window_hours as i64);
        let guard = self.inner.read();

        let mut by_url: HashMap<&str, Vec<&LoadRecord>> = HashMap::new();
        for record in guard.records.iter().filter(|r| r.timestamp > cutoff) {
            by_url.entry(record.url.as_str()).or_default().push(record);
        }

        let mut summaries: Vec<ProblemImageSummary> = by_url
            .into_iter()
            .map(|(url, records)| {
                let total = records.len();
                let failures = records.iter().filter(|r| !r.success).count();
                let times: Vec<f64> = records
                    .iter()
                    .filter(|r| r.success)
                    .map(|r| r.load_time_ms)
                    .collect();
                let last_error_kind = records
                    .iter()
                    .rev()
                    .find(|r| !r.success)
                    .and_then(|r| r.error_kind);

                ProblemImageSummary {
                    url: url.to_string(),
                    failure_rate: failures as f64 / total as f64,
                    average_load_time_ms: mean(&times),
                    total_requests: total,
                    last_error_kind,
                }
            })
            .filter(|s| {
                s.total_requests >= 5 && (s.failure_rate > 0.1 || s.average_load_time_ms > 2000.0)
            })
            .collect();

        summaries.sort_by(|a, b| b.failure_rate.total_cmp(&a.failure_rate));
        summaries
    }

    /// Most recent alerts, newest first.
    pub fn recent_alerts(&self, limit: usize) -> Vec<AlertEvent> {
        let guard = self.inner.read();
        guard.alerts.iter().rev().take(limit).cloned().collect()
    }

    /// Evict records and alerts older than `days` days.
    ///
    /// `clear_older_than(0)` clears everything.
    pub fn clear_older_than(&self, days: u32) {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let mut guard = self.inner.write();
        guard.records.retain(|r| r.timestamp > cutoff);
        guard.alerts.retain(|a| a.timestamp > cutoff);
    }

    /// Clear the record history but keep alert history intact.
    pub fn clear_records(&self) {
        self.inner.write().records.clear();
    }

    /// Export the full record history in insertion order.
    pub fn export(&self, format: ExportFormat) -> MetricsResult<String> {
        let guard = self.inner.read();
        match format {
            ExportFormat::Json => export::to_json(guard.records.iter()),
            ExportFormat::Csv => Ok(export::to_csv(guard.records.iter())),
        }
    }

    /// Snapshot of the record history in insertion order.
    pub fn snapshot(&self) -> Vec<LoadRecord> {
        self.inner.read().records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard even/odd median over a sorted slice, zero when empty.
fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Nearest-rank percentile: the ceil(pct * n)-th smallest value (1-indexed),
/// clamped to the last element. Zero when empty.
fn percentile_nearest_rank(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * pct).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn device_breakdown(window: &[&LoadRecord]) -> BTreeMap<DeviceClass, DeviceStats> {
    let mut by_device: BTreeMap<DeviceClass, Vec<&LoadRecord>> = BTreeMap::new();
    for record in window.iter().copied() {
        by_device.entry(record.device_class).or_default().push(record);
    }

    by_device
        .into_iter()
        .map(|(device, records)| {
            let total = records.len();
            let successes = records.iter().filter(|r| r.success).count();
            let times: Vec<f64> = records
                .iter()
                .filter(|r| r.success)
                .map(|r| r.load_time_ms)
                .collect();
            (
                device,
                DeviceStats {
                    total,
                    success_rate: successes as f64 / total as f64,
                    average_load_time_ms: mean(&times),
                },
            )
        })
        .collect()
}

fn time_series(window: &[&LoadRecord]) -> Vec<TimeSeriesBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<&LoadRecord>> = BTreeMap::new();
    for record in window.iter().copied() {
        buckets
            .entry(floor_to_hour(record.timestamp))
            .or_default()
            .push(record);
    }

    buckets
        .into_iter()
        .map(|(bucket_start, records)| {
            let total = records.len();
            let successes = records.iter().filter(|r| r.success).count();
            let times: Vec<f64> = records
                .iter()
                .filter(|r| r.success)
                .map(|r| r.load_time_ms)
                .collect();
            TimeSeriesBucket {
                bucket_start,
                total,
                success_rate: successes as f64 / total as f64,
                average_load_time_ms: mean(&times),
            }
        })
        .collect()
}

fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}
