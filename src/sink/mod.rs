//! Injected observability sink
//!
//! Replaces environment-based "production" branching with an explicit
//! capability: the recorder forwards every record and alert to whatever
//! `Sink` it was constructed with, and swallows delivery failures.

use crate::alert::AlertEvent;
use crate::metrics::types::LoadRecord;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink rejected event: {0}")]
    Rejected(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Event forwarded to an external observability sink.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkEvent {
    Load(LoadRecord),
    Alert(AlertEvent),
}

/// Best-effort delivery seam; callers swallow errors.
pub trait Sink: Send + Sync {
    fn send(&self, event: SinkEvent) -> SinkResult<()>;
}

/// Discards every event. The default when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn send(&self, _event: SinkEvent) -> SinkResult<()> {
        Ok(())
    }
}

/// Forwards events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn send(&self, event: SinkEvent) -> SinkResult<()> {
        match &event {
            SinkEvent::Load(record) => {
                tracing::info!(
                    url = %record.url,
                    success = record.success,
                    load_time_ms = record.load_time_ms,
                    device = record.device_class.as_str(),
                    "image load observed"
                );
            }
            SinkEvent::Alert(alert) => {
                tracing::warn!(kind = alert.kind.as_str(), "{}", alert.message);
            }
        }
        Ok(())
    }
}
