//! Schema inference
//!
//! Produces a usable [`InputSchema`] for a job definition. A declared schema
//! is normalized directly; without one, the schema is reverse-engineered from
//! the definition's example payload. Parsing failures degrade to an
//! "unavailable" outcome instead of an error so the caller can fall back to
//! a raw JSON path.

use serde_json::{Map, Value as JsonValue};
use tether_core::domain::job::JobDefinition;
use tether_core::domain::schema::{FieldDescriptor, FieldType, InputSchema};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SessionError};

/// Field names whose inferred type is forced regardless of their example value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOverrides {
    entries: Vec<(String, FieldType)>,
}

impl FieldOverrides {
    /// An empty table
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Forces `name` to `field_type`, replacing any previous entry
    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = field_type,
            None => self.entries.push((name, field_type)),
        }
    }

    /// Parses and inserts a `name=type` pair
    pub fn insert_pair(&mut self, pair: &str) -> std::result::Result<(), String> {
        let (name, field_type) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected name=type, got '{}'", pair))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing field name in '{}'", pair));
        }
        self.insert(name, field_type.parse()?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FieldOverrides {
    /// The provider's demo actor ships a misleading `helloWorld` example
    fn default() -> Self {
        let mut overrides = Self::empty();
        overrides.insert("helloWorld", FieldType::String);
        overrides
    }
}

/// Result of schema inference
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOutcome {
    /// Normalized from the provider's declared schema
    Declared(InputSchema),

    /// Derived from the example payload
    Inferred(InputSchema),

    /// No schema could be derived; the caller may offer raw JSON input
    Unavailable { reason: String },
}

impl SchemaOutcome {
    /// The schema, if one could be derived
    pub fn schema(&self) -> Option<&InputSchema> {
        match self {
            SchemaOutcome::Declared(schema) | SchemaOutcome::Inferred(schema) => Some(schema),
            SchemaOutcome::Unavailable { .. } => None,
        }
    }

    /// The schema, or an empty one when unavailable
    pub fn into_schema(self) -> InputSchema {
        match self {
            SchemaOutcome::Declared(schema) | SchemaOutcome::Inferred(schema) => schema,
            SchemaOutcome::Unavailable { .. } => InputSchema::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, SchemaOutcome::Unavailable { .. })
    }

    /// Where the schema came from, for display
    pub fn source(&self) -> &'static str {
        match self {
            SchemaOutcome::Declared(_) => "declared",
            SchemaOutcome::Inferred(_) => "example",
            SchemaOutcome::Unavailable { .. } => "unavailable",
        }
    }
}

/// Builds input schemas from declared schemas or example payloads
#[derive(Debug, Clone)]
pub struct SchemaInferenceEngine {
    overrides: FieldOverrides,
    require_source: bool,
}

impl SchemaInferenceEngine {
    pub fn new(overrides: FieldOverrides, require_source: bool) -> Self {
        Self {
            overrides,
            require_source,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.field_overrides.clone(), config.require_schema_source)
    }

    /// Infers the schema of a fetched job definition
    pub fn infer_definition(&self, definition: &JobDefinition) -> Result<SchemaOutcome> {
        debug!("Inferring input schema for {}", definition.id);
        self.infer(
            definition.declared_schema.as_ref(),
            definition.example_input.as_deref(),
        )
    }

    /// Infers a schema from a declared schema and/or an example payload
    ///
    /// A well-formed declared schema wins. Otherwise the example payload is
    /// inspected. Fails only when neither source is present and a source is
    /// required.
    pub fn infer(
        &self,
        declared: Option<&JsonValue>,
        example: Option<&str>,
    ) -> Result<SchemaOutcome> {
        if let Some(declared) = declared {
            match normalize_declared(declared) {
                Some(schema) => {
                    info!("Using declared schema with {} field(s)", schema.len());
                    return Ok(SchemaOutcome::Declared(schema));
                }
                None => debug!("Declared schema is not an object with properties, ignoring it"),
            }
        }

        let Some(example) = example else {
            if declared.is_none() && self.require_source {
                return Err(SessionError::InvalidDefinition(
                    "no declared schema and no example input".to_string(),
                ));
            }
            return Ok(SchemaOutcome::Unavailable {
                reason: "no usable declared schema and no example input".to_string(),
            });
        };

        match serde_json::from_str::<JsonValue>(example) {
            Ok(JsonValue::Object(payload)) => {
                let schema = self.infer_from_example(&payload);
                info!("Inferred schema with {} field(s) from example input", schema.len());
                Ok(SchemaOutcome::Inferred(schema))
            }
            Ok(other) => {
                warn!("Example input is not a JSON object ({})", json_kind(&other));
                Ok(SchemaOutcome::Unavailable {
                    reason: format!("example input is a JSON {}, not an object", json_kind(&other)),
                })
            }
            Err(e) => {
                warn!("Failed to parse example input: {}", e);
                Ok(SchemaOutcome::Unavailable {
                    reason: format!("example input is not valid JSON: {}", e),
                })
            }
        }
    }

    fn infer_from_example(&self, payload: &Map<String, JsonValue>) -> InputSchema {
        let mut schema = InputSchema::new();
        for (name, value) in payload {
            let field_type = self
                .overrides
                .get(name)
                .unwrap_or_else(|| type_of_example(value));
            schema.insert(name.clone(), FieldDescriptor::new(field_type));
        }
        schema
    }
}

impl Default for SchemaInferenceEngine {
    fn default() -> Self {
        Self::new(FieldOverrides::default(), false)
    }
}

fn type_of_example(value: &JsonValue) -> FieldType {
    match value {
        JsonValue::Array(_) => FieldType::Array,
        JsonValue::Bool(_) => FieldType::Boolean,
        JsonValue::Number(_) => FieldType::Number,
        _ => FieldType::String,
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Normalizes a declared schema, or returns `None` if it is not well-formed
///
/// Accepts the schema as an object or as a JSON-encoded string.
fn normalize_declared(declared: &JsonValue) -> Option<InputSchema> {
    let parsed;
    let declared = match declared {
        JsonValue::String(text) => {
            parsed = serde_json::from_str::<JsonValue>(text).ok()?;
            &parsed
        }
        other => other,
    };

    let properties = declared.get("properties")?.as_object()?;
    let required: Vec<&str> = declared
        .get("required")
        .and_then(JsonValue::as_array)
        .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
        .unwrap_or_default();

    let mut schema = InputSchema::new();
    for (name, property) in properties {
        let mut descriptor = FieldDescriptor::new(declared_type(property));
        descriptor.title = string_attr(property, "title");
        descriptor.description = string_attr(property, "description");
        descriptor.default = property.get("default").cloned();
        descriptor.required = required.contains(&name.as_str());
        schema.insert(name.clone(), descriptor);
    }
    Some(schema)
}

/// `type` may be a single name or a list such as `["integer", "null"]`
fn declared_type(property: &JsonValue) -> FieldType {
    match property.get("type") {
        Some(JsonValue::String(name)) => FieldType::from_declared(name),
        Some(JsonValue::Array(names)) => names
            .iter()
            .filter_map(JsonValue::as_str)
            .find(|name| *name != "null")
            .map(FieldType::from_declared)
            .unwrap_or(FieldType::String),
        _ => FieldType::String,
    }
}

fn string_attr(property: &JsonValue, key: &str) -> Option<String> {
    property
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}
