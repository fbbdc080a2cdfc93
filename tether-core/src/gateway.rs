//! Provider gateway contract
//!
//! The job-execution provider is an external collaborator. Everything the
//! session core needs from it goes through this trait, which keeps the core
//! independent of transport and credentials.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::domain::job::{JobDefinition, JobSummary};
use crate::domain::run::{RunInfo, RunStatusInfo};

/// Thin request/response interface to a job-execution provider
///
/// Only `poll_status` and `fetch_results` are assumed idempotent.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Lists the job definitions visible to the caller (no schemas)
    async fn list_job_definitions(&self) -> Result<Vec<JobSummary>>;

    /// Fetches one definition with its declared schema and example input
    async fn get_job_definition(&self, job_id: &str) -> Result<JobDefinition>;

    /// Starts a run of `job_id` with the given input payload
    async fn submit_run(&self, job_id: &str, input: &Map<String, JsonValue>) -> Result<RunInfo>;

    /// Reads the current status of a run
    async fn poll_status(&self, run_id: &str) -> Result<RunStatusInfo>;

    /// Reads the result records produced by a run, in order
    async fn fetch_results(&self, run_id: &str) -> Result<Vec<JsonValue>>;
}
