use std::time::Duration;

/// Retry and probe budget for URL recovery.
///
/// The delay ladder is exponential from `initial_delay` doubling up to
/// `max_delay`, which with the defaults yields 1s, 2s, 4s.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Attempts before giving up.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling the delay ladder clamps to.
    pub max_delay: Duration,
    /// Hard ceiling on a single candidate probe.
    pub probe_timeout: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(4000),
            probe_timeout: Duration::from_millis(5000),
        }
    }
}
