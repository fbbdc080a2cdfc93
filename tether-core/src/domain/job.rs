//! Job definition domain types

use serde::{Deserialize, Serialize};

/// Catalog entry for a job definition
///
/// Returned by catalog listings, which carry no schema information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A fully fetched job definition
///
/// Immutable once fetched. `declared_schema` is the provider's formal input
/// description as raw JSON; `example_input` is the sample payload body
/// shipped with the definition, kept as text because it may not even be
/// valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub declared_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub example_input: Option<String>,
}

