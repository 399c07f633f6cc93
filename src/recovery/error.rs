use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Probe setup failed: {0}")]
    ProbeSetup(String),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;
