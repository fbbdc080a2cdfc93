//! [`ProviderGateway`] implementation backed by the Apify API

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tether_core::ProviderGateway;
use tether_core::domain::job::{JobDefinition, JobSummary};
use tether_core::domain::run::{RunInfo, RunStatusInfo};

use crate::ApifyClient;

#[async_trait]
impl ProviderGateway for ApifyClient {
    async fn list_job_definitions(&self) -> Result<Vec<JobSummary>> {
        self.list_actors().await.context("Failed to list actors")
    }

    async fn get_job_definition(&self, job_id: &str) -> Result<JobDefinition> {
        self.get_actor(job_id)
            .await
            .with_context(|| format!("Failed to fetch actor {}", job_id))
    }

    async fn submit_run(&self, job_id: &str, input: &Map<String, JsonValue>) -> Result<RunInfo> {
        self.start_run(job_id, input)
            .await
            .with_context(|| format!("Failed to run actor {}", job_id))
    }

    async fn poll_status(&self, run_id: &str) -> Result<RunStatusInfo> {
        self.get_run(run_id)
            .await
            .with_context(|| format!("Failed to fetch run status for {}", run_id))
    }

    async fn fetch_results(&self, run_id: &str) -> Result<Vec<JsonValue>> {
        self.list_run_items(run_id)
            .await
            .with_context(|| format!("Failed to fetch run results for {}", run_id))
    }
}
