//! Edges connect a node's output port to another node's input port.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

fn default_port() -> String {
    "main".to_string()
}

/// A directed connection between two nodes.
///
/// The builder emits `sourceHandle`/`targetHandle` for the port names and
/// omits them for the default `main` port; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The producing node.
    pub source: NodeId,
    /// The consuming node.
    pub target: NodeId,
    /// Output port on the source node.
    #[serde(default = "default_port", alias = "sourceHandle")]
    pub source_port: String,
    /// Input port on the target node.
    #[serde(default = "default_port", alias = "targetHandle")]
    pub target_port: String,
}

impl Edge {
    /// Creates an edge on the default `main` ports.
    #[must_use]
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_port: default_port(),
            target_port: default_port(),
        }
    }

    /// Sets the source port.
    #[must_use]
    pub fn from_port(mut self, port: impl Into<String>) -> Self {
        self.source_port = port.into();
        self
    }

    /// Sets the target port.
    #[must_use]
    pub fn to_port(mut self, port: impl Into<String>) -> Self {
        self.target_port = port.into();
        self
    }
}
