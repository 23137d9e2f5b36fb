//! Per-run execution state.
//!
//! One [`ExecutionContext`] is created per run, owned exclusively by the
//! engine invocation that created it, and returned to the caller when the
//! run reaches a terminal state. The caller persists or discards it; the
//! engine itself keeps nothing.

use crate::node::NodeId;
use agentflow_core::{ExecutionId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// The status of one node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRunStatus {
    /// Not yet reached.
    Pending,
    /// Handler currently executing.
    Running,
    /// Handler finished successfully.
    Completed,
    /// Handler failed; the run aborted here.
    Error,
}

/// The recorded state of one node within a run.
///
/// Transitions running -> completed/error exactly once; a node is never
/// re-entered within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRunState {
    /// Current status.
    pub status: NodeRunStatus,
    /// When the handler started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the handler finished or failed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Snapshot of the resolved inputs.
    pub input: Option<JsonValue>,
    /// Snapshot of the handler output.
    pub output: Option<JsonValue>,
    /// Error message when status is error.
    pub error: Option<String>,
}

impl NodeRunState {
    /// Creates a pending state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: NodeRunStatus::Pending,
            started_at: None,
            ended_at: None,
            input: None,
            output: None,
            error: None,
        }
    }

    /// Marks the node running, recording the start time.
    pub fn start(&mut self) {
        self.status = NodeRunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Marks the node completed with its input/output snapshots.
    pub fn complete(&mut self, input: JsonValue, output: JsonValue) {
        self.status = NodeRunStatus::Completed;
        self.ended_at = Some(Utc::now());
        self.input = Some(input);
        self.output = Some(output);
    }

    /// Marks the node failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = NodeRunStatus::Error;
        self.ended_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Returns the wall-clock duration in milliseconds, when both
    /// timestamps are present.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

impl Default for NodeRunState {
    fn default() -> Self {
        Self::new()
    }
}

/// The status of a run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Nodes are still executing.
    Running,
    /// Every scheduled node completed.
    Completed,
    /// A node failed and the run aborted.
    Error,
}

impl RunStatus {
    /// Returns true for completed or error.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Opaque bag of capability references supplied by the caller.
///
/// Handlers look credentials up by well-known keys (e.g.
/// `openai_api_key`); the engine never inspects them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(HashMap<String, JsonValue>);

impl Credentials {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a credential.
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.0.insert(key.into(), value);
    }

    /// Inserts a credential, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, JsonValue::String(value.into()));
        self
    }

    /// Returns a credential as a string, if present.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }
}

/// The mutable record of a single run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique id of this run.
    pub execution_id: ExecutionId,
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// Results of completed nodes, keyed by node id.
    pub node_results: HashMap<NodeId, JsonValue>,
    /// Per-node run states.
    pub node_states: HashMap<NodeId, NodeRunState>,
    /// Node ids in the order they completed.
    pub execution_order: Vec<NodeId>,
    /// Error messages of failed nodes.
    pub errors: HashMap<NodeId, String>,
    /// The payload that triggered this run.
    pub trigger_payload: Map<String, JsonValue>,
    /// Caller-supplied credential bag.
    pub credentials: Credentials,
    /// Final chat-style response, when an output node produced one.
    pub chat_response: Option<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Run status.
    pub status: RunStatus,
}

impl ExecutionContext {
    /// Creates a running context with a fresh execution id.
    #[must_use]
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            workflow_id,
            node_results: HashMap::new(),
            node_states: HashMap::new(),
            execution_order: Vec::new(),
            errors: HashMap::new(),
            trigger_payload: Map::new(),
            credentials: Credentials::new(),
            chat_response: None,
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Running,
        }
    }

    /// Returns the stored result of a node, if it has completed.
    #[must_use]
    pub fn node_result(&self, node_id: &NodeId) -> Option<&JsonValue> {
        self.node_results.get(node_id)
    }

    /// Registers every scheduled node as pending, so nodes the run never
    /// reaches still show up in the report.
    pub fn seed_pending<'a>(&mut self, node_ids: impl IntoIterator<Item = &'a NodeId>) {
        for node_id in node_ids {
            self.node_states.entry(node_id.clone()).or_default();
        }
    }

    /// Marks a node running.
    pub fn mark_node_running(&mut self, node_id: &NodeId) {
        self.node_states.entry(node_id.clone()).or_default().start();
    }

    /// Records a successful node execution.
    pub fn mark_node_completed(&mut self, node_id: &NodeId, input: JsonValue, output: JsonValue) {
        self.node_results.insert(node_id.clone(), output.clone());
        self.node_states
            .entry(node_id.clone())
            .or_default()
            .complete(input, output);
        self.execution_order.push(node_id.clone());
    }

    /// Records a node failure.
    pub fn mark_node_failed(&mut self, node_id: &NodeId, error: impl Into<String>) {
        let error = error.into();
        self.errors.insert(node_id.clone(), error.clone());
        self.node_states
            .entry(node_id.clone())
            .or_default()
            .fail(error);
    }

    /// Returns true if any node failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Marks the run terminal.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Returns the run's wall-clock duration in milliseconds, once
    /// terminal.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Serializes the context into the caller-facing report format.
    #[must_use]
    pub fn report(&self) -> ExecutionReport {
        let node_states = self
            .node_states
            .iter()
            .map(|(node_id, state)| {
                (
                    node_id.clone(),
                    NodeStateReport {
                        status: state.status,
                        started_at: state.started_at,
                        ended_at: state.ended_at,
                        duration_ms: state.duration_ms(),
                        input: state.input.clone(),
                        output: state.output.clone(),
                        error: state.error.clone(),
                    },
                )
            })
            .collect();

        ExecutionReport {
            execution_id: self.execution_id,
            workflow_id: self.workflow_id,
            status: self.status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_ms: self.duration_ms(),
            execution_order: self.execution_order.clone(),
            node_states,
            errors: self.errors.clone(),
            chat_response: self.chat_response.clone(),
        }
    }
}

/// Caller-facing serialization of one node's run state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStateReport {
    pub status: NodeRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Caller-facing serialization of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    pub execution_order: Vec<NodeId>,
    pub node_states: HashMap<NodeId, NodeStateReport>,
    pub errors: HashMap<NodeId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_state_transitions() {
        let mut state = NodeRunState::new();
        assert_eq!(state.status, NodeRunStatus::Pending);

        state.start();
        assert_eq!(state.status, NodeRunStatus::Running);
        assert!(state.started_at.is_some());

        state.complete(json!({"main": 1}), json!({"main": 2}));
        assert_eq!(state.status, NodeRunStatus::Completed);
        assert!(state.duration_ms().is_some());
    }

    #[test]
    fn failed_node_recorded_in_errors() {
        let mut context = ExecutionContext::new(WorkflowId::new());
        let node_id = NodeId::new("b");

        context.mark_node_running(&node_id);
        context.mark_node_failed(&node_id, "no conditions defined");
        context.complete(RunStatus::Error);

        assert!(context.has_failures());
        assert_eq!(
            context.errors.get(&node_id).map(String::as_str),
            Some("no conditions defined")
        );
        assert_eq!(
            context.node_states[&node_id].status,
            NodeRunStatus::Error
        );
        assert!(context.execution_order.is_empty());
    }

    #[test]
    fn completed_node_appends_to_order() {
        let mut context = ExecutionContext::new(WorkflowId::new());
        let node_id = NodeId::new("a");

        context.mark_node_running(&node_id);
        context.mark_node_completed(&node_id, json!({}), json!({"main": {"ok": true}}));

        assert_eq!(context.execution_order, vec![node_id.clone()]);
        assert_eq!(
            context.node_result(&node_id),
            Some(&json!({"main": {"ok": true}}))
        );
    }

    #[test]
    fn report_uses_camel_case_wire_names() {
        let mut context = ExecutionContext::new(WorkflowId::new());
        let node_id = NodeId::new("a");
        context.mark_node_running(&node_id);
        context.mark_node_completed(&node_id, json!({}), json!({"main": null}));
        context.chat_response = Some("done".to_string());
        context.complete(RunStatus::Completed);

        let report = serde_json::to_value(context.report()).expect("serialize");
        assert_eq!(report["status"], json!("completed"));
        assert!(report["executionId"].is_string());
        assert!(report["startedAt"].is_string());
        assert!(report["durationMs"].is_number());
        assert_eq!(report["executionOrder"], json!(["a"]));
        assert_eq!(report["chatResponse"], json!("done"));
        assert!(report["nodeStates"]["a"]["durationMs"].is_number());
    }

    #[test]
    fn seeding_marks_scheduled_nodes_pending() {
        let mut context = ExecutionContext::new(WorkflowId::new());
        let scheduled = vec![NodeId::new("a"), NodeId::new("b")];
        context.seed_pending(&scheduled);

        assert_eq!(context.node_states[&NodeId::new("a")].status, NodeRunStatus::Pending);
        assert_eq!(context.node_states[&NodeId::new("b")].status, NodeRunStatus::Pending);

        // Seeding again after a node has progressed does not reset it.
        context.mark_node_running(&NodeId::new("a"));
        context.seed_pending(&scheduled);
        assert_eq!(context.node_states[&NodeId::new("a")].status, NodeRunStatus::Running);
    }

    #[test]
    fn credentials_string_lookup() {
        let credentials = Credentials::new().with("openai_api_key", "sk-test");
        assert_eq!(credentials.get_str("openai_api_key"), Some("sk-test"));
        assert_eq!(credentials.get_str("missing"), None);
    }
}
