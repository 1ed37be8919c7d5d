//! Error types for qnet-daemon

use crate::pipeline::CycleStage;
use qnet_encoder::EncodeError;
use std::time::Duration;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cycle failure surfaced to the command line
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File/environment could not be read or a required key is missing
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A key is present but its value is unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Storage-specific errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Database could not be opened or reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed
    #[error("Query error: {0}")]
    Query(String),

    /// Stored row could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Probe failures, reported as a capture error
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// No probe command configured
    #[error("no probe command configured")]
    NotConfigured,

    /// Probe process could not be started
    #[error("failed to start probe: {0}")]
    Spawn(String),

    /// Probe exited unsuccessfully
    #[error("probe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Probe output was not a measurement
    #[error("unreadable probe output: {0}")]
    Parse(String),
}

/// Completion-service failures. Never leave the insight client; callers get
/// fallback values instead.
#[derive(Debug, Clone, Error)]
pub enum InsightServiceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Malformed(String),

    #[error("response did not include choices")]
    EmptyChoices,
}

/// Reasons a pipeline cycle stopped before producing a report
#[derive(Debug, Error)]
pub enum CycleError {
    /// The probe could not deliver a sample; nothing was stored
    #[error("capture failed: {0}")]
    Capture(#[from] ProbeError),

    /// The sample or factors were unusable; nothing was stored
    #[error("invalid metric: {0}")]
    InvalidMetric(#[from] EncodeError),

    /// Reading stored records failed
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// A suspension point exceeded its deadline
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: CycleStage, after: Duration },

    /// Another cycle is still in flight
    #[error("a cycle is already in flight")]
    Busy,
}

impl CycleError {
    /// Stage the cycle was in when it stopped.
    pub fn stage(&self) -> CycleStage {
        match self {
            CycleError::Capture(_) => CycleStage::Capturing,
            CycleError::InvalidMetric(_) => CycleStage::Encoding,
            CycleError::Storage(_) => CycleStage::Persisting,
            CycleError::Timeout { stage, .. } => *stage,
            CycleError::Busy => CycleStage::Idle,
        }
    }
}

/// Result type alias for cycle operations
pub type CycleResult<T> = Result<T, CycleError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_stages() {
        assert_eq!(
            CycleError::Capture(ProbeError::NotConfigured).stage(),
            CycleStage::Capturing
        );
        assert_eq!(
            CycleError::Timeout {
                stage: CycleStage::Persisting,
                after: Duration::from_secs(1),
            }
            .stage(),
            CycleStage::Persisting
        );
        assert_eq!(CycleError::Busy.stage(), CycleStage::Idle);
    }

    #[test]
    fn test_timeout_message_names_stage() {
        let err = CycleError::Timeout {
            stage: CycleStage::Capturing,
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "capturing timed out after 5s");
    }
}
