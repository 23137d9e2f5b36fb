//! Scope keys for memory collections.
//!
//! Collections are partitioned by (workflow, node) identity so that every
//! AI-capable node keeps its own conversation history, shared across runs
//! of the same workflow.

use agentflow_core::WorkflowId;
use serde::{Deserialize, Serialize};

/// The identity of a memory collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryScope {
    /// The workflow this collection belongs to.
    pub workflow_id: WorkflowId,
    /// The node within the workflow.
    pub node_id: String,
}

impl MemoryScope {
    /// Creates a scope for the given workflow and node.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, node_id: impl Into<String>) -> Self {
        Self {
            workflow_id,
            node_id: node_id.into(),
        }
    }

    /// Returns the storage key for this scope.
    #[must_use]
    pub fn key(&self) -> String {
        format!("workflow_{}_node_{}", self.workflow_id, self.node_id)
    }
}

impl std::fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_key_format() {
        let workflow_id = WorkflowId::new();
        let scope = MemoryScope::new(workflow_id, "agent-1");
        let key = scope.key();
        assert!(key.starts_with("workflow_wf_"));
        assert!(key.ends_with("_node_agent-1"));
    }

    #[test]
    fn same_identity_same_key() {
        let workflow_id = WorkflowId::new();
        let a = MemoryScope::new(workflow_id, "n1");
        let b = MemoryScope::new(workflow_id, "n1");
        assert_eq!(a.key(), b.key());
    }
}
