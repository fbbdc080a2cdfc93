//! Input binding
//!
//! Holds the values a user enters for a job definition's input form and
//! coerces each edit according to the field's type. Values stay lenient
//! while editing; numeric text is only converted when the submission
//! payload is built.

use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};
use tether_core::domain::schema::{FieldType, InputSchema};

use crate::error::{Result, SessionError};

/// A value as entered in the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Free text from a text box or text area
    Text(String),
    /// A checkbox state
    Checked(bool),
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        RawValue::Text(text)
    }
}

impl From<bool> for RawValue {
    fn from(checked: bool) -> Self {
        RawValue::Checked(checked)
    }
}

/// A bound field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    /// Text, including not-yet-validated numeric text
    ///
    /// For unsupported fields, text holding a JSON object or array is sent
    /// as that JSON; any other text is sent as a string.
    Text(String),
    Flag(bool),
    /// Trimmed, non-empty items in entry order
    List(Vec<String>),
    /// Passed to the provider as-is
    Opaque(JsonValue),
}

#[derive(Debug, Clone, PartialEq)]
struct BoundEntry {
    name: String,
    /// `None` for fields the schema does not know
    field_type: Option<FieldType>,
    value: BoundValue,
}

/// User-entered values for one job definition, in schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundInputs {
    entries: Vec<BoundEntry>,
}

impl BoundInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a raw JSON object, used when no schema is available
    pub fn from_json(object: Map<String, JsonValue>) -> Self {
        let entries = object
            .into_iter()
            .map(|(name, value)| BoundEntry {
                name,
                field_type: None,
                value: BoundValue::Opaque(value),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, name: &str, field_type: Option<FieldType>, value: BoundValue) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(BoundEntry {
                name: name.to_string(),
                field_type,
                value,
            }),
        }
    }

    /// Builds the JSON object submitted to the provider
    ///
    /// Numeric text is parsed here: empty text is omitted so the provider's
    /// default applies, anything else must parse as the field's numeric type.
    pub fn to_payload(&self) -> Result<Map<String, JsonValue>> {
        let mut payload = Map::new();
        for entry in &self.entries {
            if let Some(value) = payload_value(entry)? {
                payload.insert(entry.name.clone(), value);
            }
        }
        Ok(payload)
    }
}

fn payload_value(entry: &BoundEntry) -> Result<Option<JsonValue>> {
    let value = match (&entry.value, entry.field_type) {
        (BoundValue::Text(text), Some(field_type)) if field_type.is_numeric() => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            JsonValue::Number(parse_number(&entry.name, text, field_type)?)
        }
        (BoundValue::Text(text), Some(FieldType::Unsupported)) => {
            if text.trim().is_empty() {
                return Ok(None);
            }
            // Only structured JSON is reinterpreted; scalars stay text
            match serde_json::from_str(text) {
                Ok(value @ (JsonValue::Object(_) | JsonValue::Array(_))) => value,
                _ => JsonValue::String(text.clone()),
            }
        }
        (BoundValue::Text(text), _) => JsonValue::String(text.clone()),
        (BoundValue::Flag(flag), _) => JsonValue::Bool(*flag),
        (BoundValue::List(items), _) => {
            JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
        }
        (BoundValue::Opaque(value), _) => value.clone(),
    };
    Ok(Some(value))
}

fn parse_number(field: &str, text: &str, field_type: FieldType) -> Result<Number> {
    let invalid = |reason: &str| SessionError::InvalidInput {
        field: field.to_string(),
        value: text.to_string(),
        reason: reason.to_string(),
    };

    if let Ok(int) = text.parse::<i64>() {
        return Ok(Number::from(int));
    }
    if field_type == FieldType::Integer {
        return Err(invalid("expected an integer"));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| invalid("expected a number"))
}

/// Seeds and edits [`BoundInputs`] for one schema
#[derive(Debug, Clone)]
pub struct InputBinder {
    schema: InputSchema,
}

impl InputBinder {
    pub fn new(schema: InputSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    /// One entry per field, from its default or a type-appropriate empty value
    pub fn seed(&self) -> BoundInputs {
        let mut bound = BoundInputs::new();
        for field in self.schema.fields() {
            let field_type = field.descriptor.field_type;
            let value = seed_value(field_type, field.descriptor.default.as_ref());
            bound.set(&field.name, Some(field_type), value);
        }
        bound
    }

    /// Applies one edit, coerced by the field's type
    ///
    /// Unknown field names are kept as opaque passthrough values.
    pub fn apply(&self, bound: &mut BoundInputs, field: &str, raw: impl Into<RawValue>) {
        let raw = raw.into();
        let Some(descriptor) = self.schema.get(field) else {
            let value = match raw {
                RawValue::Text(text) => JsonValue::String(text),
                RawValue::Checked(flag) => JsonValue::Bool(flag),
            };
            bound.set(field, None, BoundValue::Opaque(value));
            return;
        };

        let value = match (descriptor.field_type, raw) {
            (FieldType::Array, RawValue::Text(text)) => BoundValue::List(split_list(&text)),
            (FieldType::Array, RawValue::Checked(flag)) => BoundValue::List(vec![flag.to_string()]),
            (FieldType::Boolean, RawValue::Checked(flag)) => BoundValue::Flag(flag),
            (FieldType::Boolean, RawValue::Text(text)) => BoundValue::Flag(is_truthy(&text)),
            (_, RawValue::Text(text)) => BoundValue::Text(text),
            (_, RawValue::Checked(flag)) => BoundValue::Text(flag.to_string()),
        };
        bound.set(field, Some(descriptor.field_type), value);
    }
}

fn seed_value(field_type: FieldType, default: Option<&JsonValue>) -> BoundValue {
    match (field_type, default) {
        (FieldType::Boolean, Some(JsonValue::Bool(flag))) => BoundValue::Flag(*flag),
        (FieldType::Boolean, _) => BoundValue::Flag(false),
        (FieldType::Array, Some(JsonValue::Array(items))) => {
            if items.iter().all(JsonValue::is_string) {
                BoundValue::List(
                    items
                        .iter()
                        .filter_map(JsonValue::as_str)
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            } else {
                BoundValue::Opaque(JsonValue::Array(items.clone()))
            }
        }
        (FieldType::Array, _) => BoundValue::List(Vec::new()),
        (FieldType::Unsupported, Some(value)) if !value.is_string() => {
            BoundValue::Opaque(value.clone())
        }
        (_, Some(JsonValue::String(text))) => BoundValue::Text(text.clone()),
        (_, Some(JsonValue::Null)) | (_, None) => BoundValue::Text(String::new()),
        (_, Some(other)) => BoundValue::Text(other.to_string()),
    }
}

/// Splits on newlines and commas, trimming and dropping empty pieces
fn split_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_truthy(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
