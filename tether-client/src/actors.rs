//! Actor catalog endpoints

use serde_json::Value as JsonValue;
use tether_core::domain::job::{JobDefinition, JobSummary};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{ActorDetail, ActorListItem, BuildDetail, Page};
use crate::{ApifyClient, path_segment};

impl ApifyClient {
    // =============================================================================
    // Actor Catalog
    // =============================================================================

    /// List the actors owned by or available to the token's account
    ///
    /// # Returns
    /// Catalog entries without schema information
    pub async fn list_actors(&self) -> Result<Vec<JobSummary>> {
        let response = self.get("acts").send().await?;
        let page: Page<ActorListItem> = self.handle_data(response).await?;

        debug!("Listed {} actor(s)", page.items.len());
        Ok(page.items.into_iter().map(Into::into).collect())
    }

    /// Get an actor with its declared input schema and example input
    ///
    /// The declared schema is taken from the actor itself when present,
    /// otherwise from its `latest` build. A failing build lookup is not an
    /// error: the definition is returned without a declared schema.
    ///
    /// # Arguments
    /// * `actor_id` - The actor id, or `username/name`
    pub async fn get_actor(&self, actor_id: &str) -> Result<JobDefinition> {
        let response = self
            .get(&format!("acts/{}", path_segment(actor_id)))
            .send()
            .await?;
        let detail: ActorDetail = self
            .handle_data(response)
            .await
            .map_err(|e| e.or_not_found(|| format!("actor {}", actor_id)))?;

        let has_own_schema = detail.input_schema.as_ref().is_some_and(|s| !s.is_null());
        let build_schema = match detail.latest_build_id() {
            Some(build_id) if !has_own_schema => self.get_build_input_schema(build_id).await,
            _ => None,
        };

        Ok(detail.into_definition(build_schema))
    }

    /// Fetch the input schema recorded on a build, if any
    async fn get_build_input_schema(&self, build_id: &str) -> Option<JsonValue> {
        match self.get_build(build_id).await {
            Ok(build) => build.into_schema(),
            Err(e) => {
                warn!("Failed to read input schema of build {}: {}", build_id, e);
                None
            }
        }
    }

    async fn get_build(&self, build_id: &str) -> Result<BuildDetail> {
        let response = self
            .get(&format!("actor-builds/{}", path_segment(build_id)))
            .send()
            .await?;

        self.handle_data(response).await
    }
}
