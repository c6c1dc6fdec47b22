//! Declarative response schemas
//!
//! A [`ResponseSchema`] is sent to the provider to constrain decoding, and the
//! same value checks the returned JSON before it is trusted. Enum membership
//! is declared to the provider but not re-checked here; typed decoding of the
//! result rejects values outside the declared set.

use serde_json::{Map, Value};
use std::fmt;

/// Expected shape of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSchema {
    String { allowed: Option<Vec<String>> },
    Number,
    Integer,
    Boolean,
    Array(Box<ResponseSchema>),
    Object {
        properties: Vec<(String, ResponseSchema)>,
        required: Vec<String>,
    },
}

/// Where and why a value failed its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Path from the root, e.g. `$.technical.nodes[3].layer`.
    pub path: String,
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for SchemaViolation {}

impl ResponseSchema {
    pub fn string() -> Self {
        Self::String { allowed: None }
    }

    /// A string restricted to the given values.
    pub fn enumeration(values: &[&str]) -> Self {
        Self::String {
            allowed: Some(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    pub fn number() -> Self {
        Self::Number
    }

    pub fn integer() -> Self {
        Self::Integer
    }

    pub fn boolean() -> Self {
        Self::Boolean
    }

    pub fn array_of(items: ResponseSchema) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn string_list() -> Self {
        Self::array_of(Self::string())
    }

    /// An object whose fields are all required. Use [`ResponseSchema::optional`]
    /// to relax individual fields.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ResponseSchema)>,
        K: Into<String>,
    {
        let properties: Vec<(String, ResponseSchema)> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let required = properties.iter().map(|(k, _)| k.clone()).collect();
        Self::Object {
            properties,
            required,
        }
    }

    /// Drop the named fields from an object's required list. No-op on other shapes.
    pub fn optional(mut self, names: &[&str]) -> Self {
        if let Self::Object { required, .. } = &mut self {
            required.retain(|r| !names.contains(&r.as_str()));
        }
        self
    }

    /// Required field names of an object schema.
    pub fn required_fields(&self) -> &[String] {
        match self {
            Self::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Schema of a named object property.
    pub fn property(&self, name: &str) -> Option<&ResponseSchema> {
        match self {
            Self::Object { properties, .. } => {
                properties.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Item schema of an array.
    pub fn items(&self) -> Option<&ResponseSchema> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "STRING",
            Self::Number => "NUMBER",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Array(_) => "ARRAY",
            Self::Object { .. } => "OBJECT",
        }
    }

    /// Render in the provider's declarative schema format.
    pub fn to_provider_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::from(self.type_name()));
        match self {
            Self::String {
                allowed: Some(values),
            } => {
                out.insert("enum".to_string(), Value::from(values.clone()));
            }
            Self::Array(items) => {
                out.insert("items".to_string(), items.to_provider_json());
            }
            Self::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_provider_json()))
                    .collect();
                out.insert("properties".to_string(), Value::Object(props));
                if !required.is_empty() {
                    out.insert("required".to_string(), Value::from(required.clone()));
                }
            }
            _ => {}
        }
        Value::Object(out)
    }

    /// Check `value` against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let mismatch = || SchemaViolation {
            path: path.to_string(),
            reason: format!("expected {}, found {}", self.type_name(), json_kind(value)),
        };

        match self {
            Self::String { .. } => value.is_string().then_some(()).ok_or_else(mismatch),
            Self::Number => value.is_number().then_some(()).ok_or_else(mismatch),
            Self::Integer => is_integral(value).then_some(()).ok_or_else(mismatch),
            Self::Boolean => value.is_boolean().then_some(()).ok_or_else(mismatch),
            Self::Array(items) => {
                let elements = value.as_array().ok_or_else(mismatch)?;
                for (i, element) in elements.iter().enumerate() {
                    items.validate_at(element, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            Self::Object {
                properties,
                required,
            } => {
                let object = value.as_object().ok_or_else(mismatch)?;
                for name in required {
                    match object.get(name) {
                        None | Some(Value::Null) => {
                            return Err(SchemaViolation {
                                path: format!("{}.{}", path, name),
                                reason: "required field missing".to_string(),
                            })
                        }
                        Some(_) => {}
                    }
                }
                for (name, schema) in properties {
                    match object.get(name) {
                        None | Some(Value::Null) => {}
                        Some(field) => schema.validate_at(field, &format!("{}.{}", path, name))?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Only integer literals count; `3.0` would not decode into the typed fields.
fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
