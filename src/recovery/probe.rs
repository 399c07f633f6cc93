use crate::recovery::error::{RecoveryError, RecoveryResult};
use async_trait::async_trait;
use std::time::Duration;

/// Capability for testing whether a candidate URL actually loads.
///
/// Implementations report success/failure only; the recovery strategy
/// applies its own hard timeout on top, counting a timeout as failure.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn can_load(&self, url: &str) -> bool;
}

/// HTTP-backed probe: a GET that must answer with a success status.
///
/// Transport errors, non-success statuses and client-side timeouts all
/// report as "does not load".
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> RecoveryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecoveryError::ProbeSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn can_load(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(url, %err, "probe request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_construction() {
        assert!(HttpProbe::new(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_probe_rejects_unroutable_url() {
        let probe = HttpProbe::new(Duration::from_millis(200)).unwrap();
        assert!(!probe.can_load("http://127.0.0.1:1/img.jpg").await);
    }

    #[tokio::test]
    async fn test_probe_rejects_garbage_url() {
        let probe = HttpProbe::new(Duration::from_millis(200)).unwrap();
        assert!(!probe.can_load("not a url").await);
    }
}
