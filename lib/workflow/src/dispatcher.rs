//! Routes a node to the handler for its capability family.

use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::handlers::{
    ActionHandler, DataTransformHandler, FlowControlHandler, GenerativeHandler, OutputHandler,
    TriggerHandler,
};
use crate::node::{Node, NodeFamily};
use serde_json::Value as JsonValue;

/// Dispatches node executions to the family handlers.
///
/// The set of families is closed, so dispatch is a total match: every kind a
/// graph can hold has a handler here.
pub struct NodeDispatcher {
    trigger: TriggerHandler,
    generative: GenerativeHandler,
    flow: FlowControlHandler,
    data: DataTransformHandler,
    action: ActionHandler,
    output: OutputHandler,
}

impl NodeDispatcher {
    /// Creates a dispatcher with all family handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trigger: TriggerHandler,
            generative: GenerativeHandler,
            flow: FlowControlHandler,
            data: DataTransformHandler,
            action: ActionHandler,
            output: OutputHandler,
        }
    }

    /// Executes `node` with the handler for its family.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error unchanged.
    pub async fn dispatch(
        &self,
        node: &Node,
        inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        let handler: &dyn NodeHandler = match node.kind.family() {
            NodeFamily::Trigger => &self.trigger,
            NodeFamily::Generative => &self.generative,
            NodeFamily::FlowControl => &self.flow,
            NodeFamily::DataTransform => &self.data,
            NodeFamily::Action => &self.action,
            NodeFamily::Output => &self.output,
        };
        handler.execute(node, inputs, ctx).await
    }
}

impl Default for NodeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDispatcher").finish_non_exhaustive()
    }
}
