//! Engine error types

use chaff_domain::ChaffError;
use thiserror::Error;

/// Orchestrator lifecycle errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// The background loop did not stop in time
    #[error("Engine loop did not stop within {seconds}s")]
    StopTimeout { seconds: u64 },

    /// The background loop panicked or was aborted
    #[error("Engine loop join failed: {0}")]
    JoinFailed(String),
}

impl From<EngineError> for ChaffError {
    fn from(err: EngineError) -> Self {
        ChaffError::Internal(err.to_string())
    }
}

/// Convenience type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
