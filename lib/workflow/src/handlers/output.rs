//! Output nodes surface run results to the caller.

use super::value_to_string;
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeKind};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Handler for the output family.
pub struct OutputHandler;

#[async_trait]
impl NodeHandler for OutputHandler {
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::RespondToChat => respond_to_chat(node, inputs, ctx),
            NodeKind::DocumentView => document_view(node, inputs),
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not an output node"),
            }),
        }
    }
}

/// Extracts display text from a port value: the conventional members of an
/// object, a string as-is, anything else rendered as JSON.
fn display_text(value: &JsonValue, keys: &[&str]) -> String {
    if let Some(data) = value.as_object() {
        for key in keys {
            if let Some(text) = data.get(*key).and_then(JsonValue::as_str)
                && !text.is_empty()
            {
                return text.to_string();
            }
        }
        return JsonValue::Object(data.clone()).to_string();
    }
    value_to_string(value)
}

fn respond_to_chat(
    node: &Node,
    inputs: &InputMap,
    ctx: &mut HandlerContext<'_>,
) -> Result<JsonValue, NodeError> {
    let message = node
        .str_property("message")
        .map(ToString::to_string)
        .filter(|m| !m.is_empty())
        .or_else(|| {
            inputs
                .get("main")
                .map(|input| display_text(input, &["text", "message"]))
                .filter(|m| !m.is_empty())
        })
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no message to respond with".to_string(),
        })?;

    debug!(node_id = %node.id, "responding to chat");
    ctx.chat_response = Some(message.clone());

    Ok(json!({
        "main": {
            "response": message,
            "text": message,
            "sent": true,
        }
    }))
}

fn document_view(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    let content = inputs
        .get("main")
        .map(|input| display_text(input, &["text", "content", "response"]))
        .unwrap_or_default();
    let title = node.str_property("title").unwrap_or("Content Viewer");

    debug!(node_id = %node.id, title, "rendering document view");
    Ok(json!({
        "main": {
            "title": title,
            "content": content,
        }
    }))
}
