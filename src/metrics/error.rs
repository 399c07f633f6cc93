use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Export serialization failed: {0}")]
    Export(#[from] serde_json::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
