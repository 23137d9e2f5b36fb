//! Error types for graph compilation and node execution.
//!
//! Validation errors surface to the caller before a run starts; node errors
//! are caught by the engine, recorded into the execution context, and abort
//! the run.

use crate::node::NodeId;
use std::fmt;

/// Errors raised while compiling a node/edge set into a workflow graph.
///
/// A run never starts when compilation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A node declared a kind the registry does not know.
    UnknownKind {
        /// The rejected kind string.
        kind: String,
    },
    /// Two nodes share the same id.
    DuplicateNode {
        /// The duplicated id.
        node_id: NodeId,
    },
    /// An edge references a node id that does not exist.
    DanglingEdge {
        /// The edge's source id.
        source: NodeId,
        /// The edge's target id.
        target: NodeId,
    },
    /// The graph contains a cycle.
    CycleDetected,
    /// A requested node does not exist in the graph.
    NodeNotFound {
        /// The missing id.
        node_id: NodeId,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind { kind } => write!(f, "unknown node kind: {kind}"),
            Self::DuplicateNode { node_id } => write!(f, "duplicate node id: {node_id}"),
            Self::DanglingEdge { source, target } => {
                write!(f, "edge {source} -> {target} references a missing node")
            }
            Self::CycleDetected => write!(f, "workflow graph contains a cycle"),
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised by a node handler during execution.
///
/// All variants carry the failing node's id so the engine can record the
/// error against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A required input port has no resolved value.
    MissingInput {
        /// The node that required the input.
        node_id: NodeId,
        /// The missing port name.
        port: String,
    },
    /// A required property or credential is missing or malformed.
    Configuration {
        /// The misconfigured node.
        node_id: NodeId,
        /// Description of the problem.
        reason: String,
    },
    /// An external capability call failed or returned an unusable response.
    ExternalService {
        /// The node whose call failed.
        node_id: NodeId,
        /// Description of the failure.
        reason: String,
    },
    /// A conversation memory operation failed.
    Memory {
        /// The node whose memory operation failed.
        node_id: NodeId,
        /// Description of the failure.
        reason: String,
    },
}

impl NodeError {
    /// Returns the id of the node this error belongs to.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::MissingInput { node_id, .. }
            | Self::Configuration { node_id, .. }
            | Self::ExternalService { node_id, .. }
            | Self::Memory { node_id, .. } => node_id,
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { node_id, port } => {
                write!(f, "node {node_id} is missing required input: {port}")
            }
            Self::Configuration { node_id, reason } => {
                write!(f, "node {node_id} is misconfigured: {reason}")
            }
            Self::ExternalService { node_id, reason } => {
                write!(f, "external call from node {node_id} failed: {reason}")
            }
            Self::Memory { node_id, reason } => {
                write!(f, "memory operation in node {node_id} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for NodeError {}
