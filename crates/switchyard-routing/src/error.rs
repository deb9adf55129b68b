use std::result::Result as StdResult;

use serde_json::Error as JsonError;
use thiserror::Error;

use crate::types::JobId;
use switchyard_core::Error as CoreError;

pub type Result<T> = StdResult<T, RoutingError>;

/// Errors produced by the routing core.
///
/// Note what is deliberately absent: admission denial, "job not found", and
/// "job already terminal" are ordinary result variants
/// ([`crate::types::RouteOutcome`], [`crate::types::CancelOutcome`]), never
/// errors.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] JsonError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Cost estimation failed: {0}")]
    EstimationFailed(String),

    #[error("Job {0} already exists")]
    DuplicateJob(JobId),

    #[error("{0}")]
    Other(String),
}

impl RoutingError {
    /// Whether a failed backend invocation carrying this error should be
    /// retried on an alternate backend. Timeouts and unreachable or
    /// empty-output backends all fail over identically; configuration
    /// problems never do.
    #[must_use]
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::ExecutionFailed(_) => true,
            Self::Core(core) => core.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_eligibility() {
        assert!(RoutingError::Timeout(5000).is_fallback_eligible());
        assert!(RoutingError::ServiceUnavailable("ollama".to_owned()).is_fallback_eligible());
        assert!(RoutingError::ExecutionFailed("empty output".to_owned()).is_fallback_eligible());
        assert!(!RoutingError::Configuration("no key".to_owned()).is_fallback_eligible());
        assert!(!RoutingError::DuplicateJob(JobId::new()).is_fallback_eligible());
    }

    #[test]
    fn display_includes_context() {
        let error = RoutingError::Timeout(250);
        assert_eq!(error.to_string(), "Timeout after 250ms");
    }
}
