//! Apify wire types
//!
//! Shapes of the Apify v2 API payloads this client reads, and their
//! conversion into Tether domain types.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tether_core::domain::job::{JobDefinition, JobSummary};
use tether_core::domain::run::{RunInfo, RunStatus, RunStatusInfo};

use crate::error::{ClientError, Result};

/// Every object endpoint wraps its payload in `{ "data": ... }`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// One page of a list endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ActorListItem> for JobSummary {
    fn from(item: ActorListItem) -> Self {
        JobSummary {
            id: item.id,
            name: item.name,
            description: item.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExampleRunInput {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaggedBuild {
    #[serde(default)]
    pub build_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaggedBuilds {
    #[serde(default)]
    pub latest: Option<TaggedBuild>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<JsonValue>,
    #[serde(default)]
    pub example_run_input: Option<ExampleRunInput>,
    #[serde(default)]
    pub tagged_builds: Option<TaggedBuilds>,
}

impl ActorDetail {
    /// Build id of the `latest` tag, where the input schema usually lives
    pub(crate) fn latest_build_id(&self) -> Option<&str> {
        self.tagged_builds
            .as_ref()?
            .latest
            .as_ref()?
            .build_id
            .as_deref()
    }

    pub(crate) fn into_definition(self, build_schema: Option<JsonValue>) -> JobDefinition {
        JobDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            declared_schema: self.input_schema.filter(|s| !s.is_null()).or(build_schema),
            example_input: self.example_run_input.and_then(|input| input.body),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorDefinition {
    #[serde(default)]
    pub input: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildDetail {
    #[serde(default)]
    pub actor_definition: Option<ActorDefinition>,
    #[serde(default)]
    pub input_schema: Option<JsonValue>,
}

impl BuildDetail {
    /// The build's input schema, preferring the actor definition's copy
    pub(crate) fn into_schema(self) -> Option<JsonValue> {
        self.actor_definition
            .and_then(|definition| definition.input)
            .filter(|s| !s.is_null())
            .or(self.input_schema)
            .filter(|s| !s.is_null())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorRun {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl ActorRun {
    pub(crate) fn into_info(self) -> Result<RunInfo> {
        Ok(RunInfo {
            status: map_status(&self.status)?,
            run_id: self.id,
        })
    }

    pub(crate) fn into_status_info(self) -> Result<RunStatusInfo> {
        Ok(RunStatusInfo {
            status: map_status(&self.status)?,
            run_id: self.id,
            status_message: self.status_message,
        })
    }
}

/// Maps an Apify run status onto the Tether lifecycle
///
/// Transitional statuses count as running; a timeout is a failure.
pub fn map_status(status: &str) -> Result<RunStatus> {
    match status {
        "READY" => Ok(RunStatus::Starting),
        "RUNNING" | "TIMING-OUT" | "ABORTING" => Ok(RunStatus::Running),
        "SUCCEEDED" => Ok(RunStatus::Succeeded),
        "FAILED" | "TIMED-OUT" => Ok(RunStatus::Failed),
        "ABORTED" => Ok(RunStatus::Aborted),
        other => Err(ClientError::ParseError(format!(
            "unknown run status '{}'",
            other
        ))),
    }
}
