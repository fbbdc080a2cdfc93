//! Run lifecycle endpoints

use serde_json::{Map, Value as JsonValue};
use tether_core::domain::run::{RunInfo, RunStatusInfo};
use tracing::debug;

use crate::error::Result;
use crate::models::ActorRun;
use crate::{ApifyClient, path_segment};

impl ApifyClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Start a run of an actor without waiting for it to finish
    ///
    /// # Arguments
    /// * `actor_id` - The actor id, or `username/name`
    /// * `input` - The JSON input object
    ///
    /// # Returns
    /// The new run's id and initial status
    pub async fn start_run(&self, actor_id: &str, input: &Map<String, JsonValue>) -> Result<RunInfo> {
        let response = self
            .post(&format!("acts/{}/runs", path_segment(actor_id)))
            .json(input)
            .send()
            .await?;
        let run: ActorRun = self.handle_data(response).await?;

        debug!("Started run {} ({})", run.id, run.status);
        run.into_info()
    }

    /// Get the current status of a run
    ///
    /// # Arguments
    /// * `run_id` - The run id
    pub async fn get_run(&self, run_id: &str) -> Result<RunStatusInfo> {
        let response = self
            .get(&format!("actor-runs/{}", path_segment(run_id)))
            .send()
            .await?;
        let run: ActorRun = self
            .handle_data(response)
            .await
            .map_err(|e| e.or_not_found(|| format!("run {}", run_id)))?;

        run.into_status_info()
    }

    /// List the items of a run's default dataset, in order
    ///
    /// # Arguments
    /// * `run_id` - The run id
    pub async fn list_run_items(&self, run_id: &str) -> Result<Vec<JsonValue>> {
        let response = self
            .get(&format!("actor-runs/{}/dataset/items", path_segment(run_id)))
            .query(&[("format", "json"), ("clean", "true")])
            .send()
            .await?;

        // Dataset items come back as a bare array, not wrapped in `data`
        self.handle_response(response).await
    }
}
