//! Input schema domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Type of a single input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    /// A type the form cannot edit (e.g. nested objects)
    Unsupported,
}

impl FieldType {
    /// Maps a JSON-schema style type name to a field type
    ///
    /// `object` is known but not form-editable and becomes `Unsupported`;
    /// anything unrecognized falls back to `String`.
    pub fn from_declared(name: &str) -> Self {
        match name {
            "object" => FieldType::Unsupported,
            other => other.parse().unwrap_or(FieldType::String),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Unsupported => "unsupported",
        }
    }

    /// Whether bound values of this type are kept as numeric text
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Number)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "integer" => Ok(FieldType::Integer),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            "array" => Ok(FieldType::Array),
            "unsupported" => Ok(FieldType::Unsupported),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

/// Description of one input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    /// A bare descriptor of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            title: None,
            description: None,
            default: None,
            required: false,
        }
    }
}

/// A named field inside an [`InputSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
}

/// Ordered set of input fields
///
/// Field order is the insertion order of the source the schema was built
/// from. Field names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    fields: Vec<SchemaField>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, or replaces the descriptor of an existing one in place
    ///
    /// Returns the previous descriptor when the name was already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: FieldDescriptor,
    ) -> Option<FieldDescriptor> {
        let name = name.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            return Some(std::mem::replace(&mut existing.descriptor, descriptor));
        }
        self.fields.push(SchemaField { name, descriptor });
        None
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.descriptor)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_mapping() {
        assert_eq!(FieldType::from_declared("integer"), FieldType::Integer);
        assert_eq!(FieldType::from_declared("array"), FieldType::Array);
        assert_eq!(FieldType::from_declared("object"), FieldType::Unsupported);
        assert_eq!(FieldType::from_declared("enum"), FieldType::String);
        assert_eq!(FieldType::from_declared(""), FieldType::String);
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!("Boolean".parse::<FieldType>(), Ok(FieldType::Boolean));
        assert!("object".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_insert_preserves_order_and_uniqueness() {
        let mut schema = InputSchema::new();
        schema.insert("b", FieldDescriptor::new(FieldType::String));
        schema.insert("a", FieldDescriptor::new(FieldType::Number));
        let previous = schema.insert("b", FieldDescriptor::new(FieldType::Boolean));

        assert_eq!(previous.map(|d| d.field_type), Some(FieldType::String));
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(schema.get("b").map(|d| d.field_type), Some(FieldType::Boolean));
        assert_eq!(schema.len(), 2);
    }
}
