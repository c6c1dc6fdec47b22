//! Response normalization
//!
//! Raw body text goes through four steps, each of which fails closed:
//! parse as JSON, check against the declared schema, apply the task's reshape
//! rule, decode into the typed result. Nothing is extracted from prose or
//! guessed from a partial body.

use crate::schema::{ResponseSchema, SchemaViolation};
use aerogate_core::{GraphNode, WireGraphNode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why a body could not be normalized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("body is not valid JSON: {0}")]
    NotJson(String),

    #[error("schema violation at {0}")]
    Schema(SchemaViolation),

    #[error("cannot reshape {pointer}: {reason}")]
    Reshape { pointer: String, reason: String },

    #[error("cannot decode result: {0}")]
    Decode(String),
}

impl From<SchemaViolation> for NormalizeError {
    fn from(violation: SchemaViolation) -> Self {
        Self::Schema(violation)
    }
}

/// Post-parse reshaping applied to a task's JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reshape {
    None,
    /// Flatten the `attributes` list of each graph node in the array at this
    /// JSON pointer into a `properties` map.
    FlattenNodeAttributes(&'static str),
}

/// Parse body text as JSON. Surrounding whitespace is allowed; anything else is not.
pub fn parse_body(text: &str) -> Result<Value, NormalizeError> {
    serde_json::from_str(text.trim()).map_err(|e| NormalizeError::NotJson(e.to_string()))
}

/// Apply a reshape rule in place.
pub fn reshape(value: &mut Value, rule: Reshape) -> Result<(), NormalizeError> {
    match rule {
        Reshape::None => Ok(()),
        Reshape::FlattenNodeAttributes(pointer) => flatten_nodes_at(value, pointer),
    }
}

fn flatten_nodes_at(value: &mut Value, pointer: &str) -> Result<(), NormalizeError> {
    let reshape_err = |reason: String| NormalizeError::Reshape {
        pointer: pointer.to_string(),
        reason,
    };

    let nodes = value
        .pointer_mut(pointer)
        .ok_or_else(|| reshape_err("path not found".to_string()))?
        .as_array_mut()
        .ok_or_else(|| reshape_err("not an array".to_string()))?;

    for (i, slot) in nodes.iter_mut().enumerate() {
        let wire: WireGraphNode = serde_json::from_value(slot.take())
            .map_err(|e| reshape_err(format!("node {}: {}", i, e)))?;
        *slot = serde_json::to_value(GraphNode::from(wire))
            .map_err(|e| reshape_err(format!("node {}: {}", i, e)))?;
    }
    Ok(())
}

/// Parse, validate against `schema` when given, and reshape.
pub fn normalize(
    text: &str,
    schema: Option<&ResponseSchema>,
    rule: Reshape,
) -> Result<Value, NormalizeError> {
    let mut value = parse_body(text)?;
    if let Some(schema) = schema {
        schema.validate(&value)?;
    }
    reshape(&mut value, rule)?;
    Ok(value)
}

/// Decode normalized JSON into a typed result. Enum values outside the
/// declared set fail here.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, NormalizeError> {
    serde_json::from_value(value).map_err(|e| NormalizeError::Decode(e.to_string()))
}
