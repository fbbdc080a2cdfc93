//! Run domain model
//!
//! Represents one invocation of a job definition as observed by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Accepted by the provider, not yet executing
    Starting,

    /// Executing
    Running,

    /// Finished successfully, results are available
    Succeeded,

    /// Finished with an error
    Failed,

    /// Stopped before completion
    Aborted,
}

impl RunStatus {
    /// Whether no further transitions can follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Aborted
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Starting => write!(f, "STARTING"),
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Succeeded => write!(f, "SUCCEEDED"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Provider acknowledgement of a submitted run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub status: RunStatus,
}

/// One status observation for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatusInfo {
    pub run_id: String,
    pub status: RunStatus,
    pub status_message: Option<String>,
}

/// Immutable snapshot of a tracked run
///
/// `final_results` is only ever present when `status` is `Succeeded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: RunStatus,
    pub status_message: Option<String>,
    pub final_results: Option<Vec<serde_json::Value>>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    /// The snapshot taken right after a run is accepted
    pub fn starting(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Starting,
            status_message: None,
            final_results: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether `info` would change what this snapshot shows
    pub fn differs_from(&self, info: &RunStatusInfo) -> bool {
        self.status != info.status || self.status_message != info.status_message
    }

    /// A new snapshot reflecting a status observation
    pub fn observe(&self, info: &RunStatusInfo) -> Self {
        Self {
            run_id: self.run_id.clone(),
            status: info.status,
            status_message: info.status_message.clone(),
            final_results: None,
            updated_at: Utc::now(),
        }
    }

    /// A new snapshot carrying the results of a succeeded run
    pub fn with_results(&self, results: Vec<serde_json::Value>) -> Self {
        Self {
            final_results: Some(results),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(status: RunStatus, message: Option<&str>) -> RunStatusInfo {
        RunStatusInfo {
            run_id: "r1".to_string(),
            status,
            status_message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Starting.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Aborted.is_terminal());
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&RunStatus::Succeeded).unwrap();
        assert_eq!(json, "\"SUCCEEDED\"");
    }

    #[test]
    fn test_observe_and_differs() {
        let state = RunState::starting("r1");
        assert!(!state.differs_from(&info(RunStatus::Starting, None)));
        assert!(state.differs_from(&info(RunStatus::Running, None)));

        let running = state.observe(&info(RunStatus::Running, Some("crawling")));
        assert_eq!(running.status, RunStatus::Running);
        assert!(running.differs_from(&info(RunStatus::Running, Some("done"))));
        assert!(running.final_results.is_none());
    }
}
