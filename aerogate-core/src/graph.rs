//! Graph artifact for ripple and change-triage analysis
//!
//! Nodes carry a flat key/value property bag. On the wire the provider emits
//! the bag as an `attributes` list of `{key, value}` pairs; [`WireGraphNode`]
//! is that shape and converts into [`GraphNode`] by flattening.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Category of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeCategory {
    Part,
    System,
    Document,
    Regulation,
    Tool,
    Risk,
}

impl NodeCategory {
    pub const ALL: [&'static str; 6] = ["PART", "SYSTEM", "DOCUMENT", "REGULATION", "TOOL", "RISK"];
}

/// Category of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeCategory {
    Physical,
    Functional,
    Regulatory,
}

impl EdgeCategory {
    pub const ALL: [&'static str; 3] = ["PHYSICAL", "FUNCTIONAL", "REGULATORY"];
}

/// One `{key, value}` pair as transmitted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub key: String,
    pub value: String,
}

impl NodeAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Graph node as transmitted by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub category: NodeCategory,
    pub layer: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<NodeAttribute>,
}

/// Graph node with its property bag flattened.
///
/// `layer` is a layout hint (1 origin, 2 direct, 3 ripple, 4 certification),
/// not a topological guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub category: NodeCategory,
    pub layer: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Collapse `{key, value}` pairs into a map. Later duplicates overwrite earlier ones.
pub fn flatten_attributes<I>(attributes: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = NodeAttribute>,
{
    let mut properties = BTreeMap::new();
    for attr in attributes {
        properties.insert(attr.key, attr.value);
    }
    properties
}

impl From<WireGraphNode> for GraphNode {
    fn from(node: WireGraphNode) -> Self {
        Self {
            id: node.id,
            label: node.label,
            category: node.category,
            layer: node.layer,
            description: node.description,
            properties: flatten_attributes(node.attributes),
        }
    }
}

/// Directed edge between two nodes of the same artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    #[serde(rename = "type")]
    pub category: EdgeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Nodes and directed edges of a dependency or ripple-effect map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphArtifact {
    /// Edges whose `from` or `to` does not name a node in this artifact.
    pub fn dangling_edges(&self) -> Vec<&GraphEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.from.as_str()) || !ids.contains(e.to.as_str()))
            .collect()
    }

    /// Fail on the first edge that references an unknown node.
    pub fn validate_edges(&self) -> Result<(), ValidationError> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(ValidationError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Nodes assigned to a layout layer.
    pub fn nodes_in_layer(&self, layer: i64) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.layer == layer)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
