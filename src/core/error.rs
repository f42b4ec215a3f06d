//! Error types for verdict.

use thiserror::Error;

/// Result type alias for verdict operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in verdict operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (fatal, raised before any dispatch)
    #[error("Calibration {value} outside the accepted range (0, 2]")]
    CalibrationConfig { value: f64 },

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    // Vote collection errors
    #[error("Vote collection from {participant} timed out after {timeout_ms}ms")]
    VoteCollectionTimeout { participant: String, timeout_ms: u64 },

    #[error("Vote collection failed: {0}")]
    VoteCollection(String),

    #[error("Malformed vote: {0}")]
    MalformedVote(String),

    // Workflow errors
    #[error("Workflow {workflow_id} aborted at round {round}: {reason}")]
    WorkflowAborted {
        workflow_id: String,
        round: usize,
        reason: String,
    },

    #[error("Template failed: {0}")]
    Template(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a failed collection attempt may be retried.
    ///
    /// Only timeouts and transient collector failures qualify. A malformed
    /// response, or any other error a collector surfaces, ends the
    /// participant's attempt sequence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::VoteCollectionTimeout { .. } | Error::VoteCollection(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = Error::VoteCollectionTimeout {
            participant: "agent-1".to_string(),
            timeout_ms: 100,
        };
        assert!(timeout.is_retryable());
        assert!(Error::VoteCollection("connection reset".to_string()).is_retryable());

        assert!(!Error::MalformedVote("confidence 1.4".to_string()).is_retryable());
        assert!(!Error::Internal("boom".to_string()).is_retryable());
        assert!(!Error::CalibrationConfig { value: 3.0 }.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::CalibrationConfig { value: 2.5 };
        assert!(err.to_string().contains("2.5"));

        let err = Error::WorkflowAborted {
            workflow_id: "wf-1".to_string(),
            round: 2,
            reason: "cancelled".to_string(),
        };
        assert_eq!(err.to_string(), "Workflow wf-1 aborted at round 2: cancelled");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
