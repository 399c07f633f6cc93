use crate::metrics::telemetry;
use crate::metrics::types::{ErrorKind, LoadEvent};
use crate::metrics::MetricsRecorder;
use crate::recovery::error::RecoveryResult;
use crate::recovery::probe::{HttpProbe, UrlProbe};
use crate::recovery::rewrite;
use crate::recovery::types::RecoveryConfig;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::sync::Arc;

/// Bounded rewrite-and-probe recovery for failing image URLs.
///
/// Each attempt dispatches to a rewrite strategy selected by the error
/// classification and probes the candidates in order; the first candidate
/// that loads wins. Failed attempts are fed back into the recorder and
/// retried after an exponential delay until the budget runs out.
pub struct ErrorRecoveryStrategy {
    recorder: Arc<MetricsRecorder>,
    probe: Arc<dyn UrlProbe>,
    config: RecoveryConfig,
}

impl ErrorRecoveryStrategy {
    pub fn new(recorder: Arc<MetricsRecorder>, probe: Arc<dyn UrlProbe>) -> Self {
        Self::with_config(recorder, probe, RecoveryConfig::default())
    }

    pub fn with_config(
        recorder: Arc<MetricsRecorder>,
        probe: Arc<dyn UrlProbe>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            recorder,
            probe,
            config,
        }
    }

    /// Strategy probing candidates over HTTP with the configured timeout.
    pub fn with_http_probe(recorder: Arc<MetricsRecorder>) -> RecoveryResult<Self> {
        let config = RecoveryConfig::default();
        let probe = Arc::new(HttpProbe::new(config.probe_timeout)?);
        Ok(Self::with_config(recorder, probe, config))
    }

    /// Try to find a working alternative for `url`.
    ///
    /// `retry_count` is the number of attempts already spent on this URL;
    /// pass 0 on first failure. Returns the recovered URL, or `None` once
    /// the budget is exhausted, in which case callers keep their fallback
    /// image. Never
    /// returns an error and never hangs: each probe is capped by the
    /// configured timeout.
    pub async fn attempt_recovery(
        &self,
        url: &str,
        kind: ErrorKind,
        retry_count: u32,
    ) -> Option<String> {
        let mut backoff = self.backoff();
        // Re-entry at attempt N resumes the ladder where attempt N-1 left it
        for _ in 1..retry_count {
            let _ = backoff.next_backoff();
        }

        let mut attempt = retry_count;
        while attempt < self.config.max_retries {
            if attempt > 0 {
                let delay = backoff.next_backoff().unwrap_or(self.config.max_delay);
                tracing::debug!(url, attempt, ?delay, "delaying before recovery retry");
                tokio::time::sleep(delay).await;
            }

            for candidate in rewrite::candidates_for(url, kind) {
                telemetry::record_recovery_attempt(kind.as_str());
                if self.probe_candidate(&candidate).await {
                    telemetry::record_recovery_success(kind.as_str());
                    tracing::info!(url, candidate = candidate.as_str(), "image url recovered");
                    self.recorder.record_success(url, None);
                    return Some(candidate);
                }
            }

            tracing::warn!(
                url,
                attempt,
                error = kind.as_str(),
                "recovery attempt failed"
            );
            self.recorder.mark_retry(url);
            self.recorder
                .record_load(LoadEvent::failure(url, kind).with_retry_count(attempt + 1));
            attempt += 1;
        }

        tracing::warn!(url, "recovery budget exhausted, keeping fallback image");
        None
    }

    async fn probe_candidate(&self, url: &str) -> bool {
        match tokio::time::timeout(self.config.probe_timeout, self.probe.can_load(url)).await {
            Ok(loaded) => loaded,
            // Timeout counts as a failed load
            Err(_) => false,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.config.initial_delay,
            initial_interval: self.config.initial_delay,
            max_interval: self.config.max_delay,
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct NeverLoads;

    #[async_trait]
    impl UrlProbe for NeverLoads {
        async fn can_load(&self, _url: &str) -> bool {
            false
        }
    }

    struct LoadsWhenContains {
        needle: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl LoadsWhenContains {
        fn new(needle: &'static str) -> Self {
            Self {
                needle,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UrlProbe for LoadsWhenContains {
        async fn can_load(&self, url: &str) -> bool {
            self.calls.lock().push(url.to_string());
            url.contains(self.needle)
        }
    }

    struct SlowProbe {
        delay: Duration,
    }

    #[async_trait]
    impl UrlProbe for SlowProbe {
        async fn can_load(&self, _url: &str) -> bool {
            tokio::time::sleep(self.delay).await;
            true
        }
    }

    fn fast_config() -> RecoveryConfig {
        RecoveryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            probe_timeout: Duration::from_millis(50),
        }
    }

    fn strategy(probe: Arc<dyn UrlProbe>) -> (Arc<MetricsRecorder>, ErrorRecoveryStrategy) {
        let recorder = Arc::new(MetricsRecorder::new());
        let strategy = ErrorRecoveryStrategy::with_config(recorder.clone(), probe, fast_config());
        (recorder, strategy)
    }

    #[test]
    fn test_backoff_ladder() {
        let recorder = Arc::new(MetricsRecorder::new());
        let defaults = ErrorRecoveryStrategy::new(recorder, Arc::new(NeverLoads));
        let mut backoff = defaults.backoff();

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(1000)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(2000)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(4000)));
        // Clamped at the ceiling from here on
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(4000)));
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_none_immediately() {
        let probe = Arc::new(LoadsWhenContains::new("never-matches"));
        let (_, strategy) = strategy(probe.clone());

        let result = strategy
            .attempt_recovery("https://x.test/a.jpg", ErrorKind::Network, 3)
            .await;

        assert!(result.is_none());
        assert!(probe.calls.lock().is_empty(), "no probes past the budget");
    }

    #[tokio::test]
    async fn test_recovery_terminates_and_records_failures() {
        let (recorder, strategy) = strategy(Arc::new(NeverLoads));

        let result = strategy
            .attempt_recovery("https://x.test/a.jpg", ErrorKind::Unknown, 0)
            .await;

        assert!(result.is_none());
        let records = recorder.snapshot();
        assert_eq!(records.len(), 3, "one failure record per attempt");
        // Every earlier failure record ends up carrying the full attempt count
        assert!(records.iter().all(|r| !r.success && r.retry_count == 3));
    }

    #[tokio::test]
    async fn test_validation_recovery_marks_resolution() {
        let probe = Arc::new(LoadsWhenContains::new("https://assets.test/photo.jpg"));
        let (recorder, strategy) = strategy(probe);

        recorder.record_load(LoadEvent::failure(
            "http://assets.test/photo.jpg",
            ErrorKind::Validation,
        ));

        let result = strategy
            .attempt_recovery("http://assets.test/photo.jpg", ErrorKind::Validation, 0)
            .await;

        assert_eq!(result, Some("https://assets.test/photo.jpg".to_string()));

        let records = recorder.snapshot();
        assert!(records[0].resolved, "original failure marked resolved");
        assert!(records[1].success, "resolution recorded as a success");
    }

    #[tokio::test]
    async fn test_first_successful_candidate_wins() {
        let probe = Arc::new(LoadsWhenContains::new("format=auto"));
        let (_, strategy) = strategy(probe.clone());

        let url = "https://cdn.example.com/photo.jpg?quality=90&format=webp";
        let result = strategy
            .attempt_recovery(url, ErrorKind::Network, 0)
            .await
            .unwrap();

        assert!(result.contains("format=auto"));
        let calls = probe.calls.lock();
        assert!(calls[0].contains("quality=auto"), "quality tried first");
        assert!(calls[1].contains("format=auto"));
        assert_eq!(calls.len(), 2, "probing stops at the first success");
    }

    #[tokio::test]
    async fn test_probe_timeout_counts_as_failure() {
        let probe = Arc::new(SlowProbe {
            delay: Duration::from_millis(500),
        });
        let config = RecoveryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            probe_timeout: Duration::from_millis(20),
        };
        let recorder = Arc::new(MetricsRecorder::new());
        let strategy = ErrorRecoveryStrategy::with_config(recorder, probe, config);

        let started = tokio::time::Instant::now();
        let result = strategy
            .attempt_recovery("https://x.test/a.jpg", ErrorKind::Unknown, 0)
            .await;

        assert!(result.is_none());
        assert!(
            started.elapsed() < Duration::from_millis(400),
            "timeout cut the slow probe short"
        );
    }
}
