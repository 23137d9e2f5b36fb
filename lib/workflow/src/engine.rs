//! The workflow execution engine.
//!
//! One [`WorkflowExecutionEngine`] is built per process around an injected
//! [`Services`] set. Each call to [`WorkflowExecutionEngine::execute`]
//! compiles the graph, schedules it, and runs the nodes sequentially in
//! dependency order, failing fast on the first node error.

use crate::context::{Credentials, ExecutionContext, RunStatus};
use crate::dispatcher::NodeDispatcher;
use crate::edge::Edge;
use crate::error::ValidationError;
use crate::graph::WorkflowGraph;
use crate::handler::{HandlerContext, Services};
use crate::node::{Node, NodeId};
use crate::router::resolve_inputs;
use agentflow_core::WorkflowId;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

/// Parameters of one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    /// The payload that triggered the run; trigger nodes shape it into
    /// their output.
    pub trigger_payload: Map<String, JsonValue>,
    /// Credentials handlers may look up by well-known keys.
    pub credentials: Credentials,
    /// When set, only the start node together with its ancestors and
    /// descendants is executed.
    pub start_node: Option<NodeId>,
}

impl ExecutionRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trigger payload.
    #[must_use]
    pub fn with_trigger_payload(mut self, payload: Map<String, JsonValue>) -> Self {
        self.trigger_payload = payload;
        self
    }

    /// Sets the credential bag.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Restricts the run to the subgraph around one node.
    #[must_use]
    pub fn with_start_node(mut self, start_node: impl Into<NodeId>) -> Self {
        self.start_node = Some(start_node.into());
        self
    }
}

/// Executes workflow graphs against a fixed service set.
#[derive(Debug)]
pub struct WorkflowExecutionEngine {
    services: Services,
    dispatcher: NodeDispatcher,
}

impl WorkflowExecutionEngine {
    /// Creates an engine around the given services.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services,
            dispatcher: NodeDispatcher::new(),
        }
    }

    /// Executes a workflow and returns its finished run record.
    ///
    /// The graph is compiled and scheduled up front; structural problems
    /// surface as an error before any node runs. Node failures do not: the
    /// failing node is recorded in the returned context, the run aborts,
    /// and the context's status is error.
    ///
    /// # Errors
    ///
    /// Returns an error when the node/edge lists do not form a valid
    /// acyclic graph, or when the requested start node does not exist.
    #[instrument(skip_all, fields(workflow_id = %workflow_id))]
    pub async fn execute(
        &self,
        workflow_id: WorkflowId,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        request: ExecutionRequest,
    ) -> Result<ExecutionContext, ValidationError> {
        let mut graph = WorkflowGraph::compile(nodes, edges)?;
        if let Some(start) = &request.start_node {
            graph = graph.execution_subgraph(start)?;
            debug!(start = %start, nodes = graph.node_count(), "restricted to subgraph");
        }
        let order = graph.execution_order()?;
        info!(nodes = order.len(), "starting workflow execution");

        let mut context = ExecutionContext::new(workflow_id);
        context.trigger_payload = request.trigger_payload;
        context.credentials = request.credentials;
        context.seed_pending(&order);

        for node_id in &order {
            // Scheduled ids come from the compiled graph, so the node is
            // always present.
            let Some(node) = graph.node(node_id) else {
                continue;
            };

            context.mark_node_running(node_id);
            let inputs = resolve_inputs(&graph, node_id, &context);
            debug!(node_id = %node_id, kind = %node.kind, "executing node");

            let mut handler_ctx = HandlerContext::new(
                workflow_id,
                &context.trigger_payload,
                &context.credentials,
                &self.services,
            );
            match self.dispatcher.dispatch(node, &inputs, &mut handler_ctx).await {
                Ok(output) => {
                    if let Some(response) = handler_ctx.chat_response {
                        context.chat_response = Some(response);
                    }
                    context.mark_node_completed(node_id, JsonValue::Object(inputs), output);
                }
                Err(error) => {
                    warn!(node_id = %node_id, %error, "node failed, aborting run");
                    context.mark_node_failed(node_id, error.to_string());
                    context.complete(RunStatus::Error);
                    return Ok(context);
                }
            }
        }

        context.complete(RunStatus::Completed);
        info!(
            executed = context.execution_order.len(),
            duration_ms = context.duration_ms(),
            "workflow execution completed"
        );
        Ok(context)
    }
}
