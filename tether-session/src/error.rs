//! Error types for the session core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced to the UI layer
///
/// Every variant carries the originating message so the caller can present
/// it and offer to restart the affected step. The core never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No usable schema source for a job definition
    #[error("Invalid job definition: {0}")]
    InvalidDefinition(String),

    /// A bound value could not be converted into the submission payload
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The provider rejected the run start
    #[error("Failed to submit run: {0}")]
    Submission(String),

    /// Status polling failed; the run's true status is unknown
    #[error("Polling run {run_id} failed: {message}")]
    Polling { run_id: String, message: String },

    /// The run succeeded but its results could not be retrieved
    #[error("Fetching results of run {run_id} failed: {message}")]
    ResultFetch { run_id: String, message: String },
}

impl SessionError {
    /// Wrap a gateway failure raised while submitting
    pub fn submission(err: &anyhow::Error) -> Self {
        Self::Submission(format!("{:#}", err))
    }

    /// Wrap a gateway failure raised while polling `run_id`
    pub fn polling(run_id: &str, err: &anyhow::Error) -> Self {
        Self::Polling {
            run_id: run_id.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Wrap a gateway failure raised while fetching results of `run_id`
    pub fn result_fetch(run_id: &str, err: &anyhow::Error) -> Self {
        Self::ResultFetch {
            run_id: run_id.to_string(),
            message: format!("{:#}", err),
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDefinition(_) => "InvalidDefinition",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::Submission(_) => "SubmissionError",
            Self::Polling { .. } => "PollingError",
            Self::ResultFetch { .. } => "ResultFetchError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_gateway_message_is_kept() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = err.context("Failed to read run").unwrap_err();

        let polling = SessionError::polling("r1", &err);
        assert_eq!(polling.kind(), "PollingError");
        assert!(polling.to_string().contains("connection reset"));
        assert!(polling.to_string().contains("r1"));
    }
}
