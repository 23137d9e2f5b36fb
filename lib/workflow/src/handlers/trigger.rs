//! Trigger nodes shape the run's trigger payload into a port record.

use super::value_to_string;
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeKind};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Handler for the trigger family.
pub struct TriggerHandler;

#[async_trait]
impl NodeHandler for TriggerHandler {
    async fn execute(
        &self,
        node: &Node,
        _inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::WhenChatReceived => Ok(chat_trigger(node, ctx)),
            NodeKind::Webhook => Ok(webhook_trigger(node, ctx)),
            NodeKind::Schedule => Ok(schedule_trigger(node, ctx)),
            NodeKind::ManualTrigger => Ok(manual_trigger(node, ctx)),
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not a trigger node"),
            }),
        }
    }
}

fn payload_str(ctx: &HandlerContext<'_>, key: &str) -> String {
    ctx.trigger_payload
        .get(key)
        .map(value_to_string)
        .unwrap_or_default()
}

fn chat_trigger(node: &Node, ctx: &HandlerContext<'_>) -> JsonValue {
    let channel = node.str_property("channel").unwrap_or_default();
    let message = payload_str(ctx, "message");
    let user = ctx
        .trigger_payload
        .get("user")
        .map(value_to_string)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "anonymous".to_string());

    debug!(node_id = %node.id, channel, "chat trigger activated");

    json!({
        "main": {
            "message": message,
            "user": user,
            "channel": channel,
            "timestamp": payload_str(ctx, "timestamp"),
            // Downstream nodes read "text" regardless of trigger kind.
            "text": message,
        }
    })
}

fn webhook_trigger(node: &Node, ctx: &HandlerContext<'_>) -> JsonValue {
    let path = node.str_property("path").unwrap_or("/webhook");
    let methods = node
        .property("method")
        .cloned()
        .unwrap_or_else(|| json!(["POST"]));
    let data = JsonValue::Object(ctx.trigger_payload.clone());

    debug!(node_id = %node.id, path, "webhook trigger activated");

    json!({
        "main": {
            "path": path,
            "methods": methods,
            "text": data.to_string(),
            "data": data,
        }
    })
}

fn schedule_trigger(node: &Node, ctx: &HandlerContext<'_>) -> JsonValue {
    let interval = node.str_property("interval").unwrap_or("hours");
    let value = node.u64_property("value").unwrap_or(1);

    debug!(node_id = %node.id, interval, value, "schedule trigger activated");

    json!({
        "main": {
            "interval": interval,
            "value": value,
            "triggered_at": payload_str(ctx, "timestamp"),
            "text": format!("Scheduled execution every {value} {interval}"),
        }
    })
}

fn manual_trigger(node: &Node, ctx: &HandlerContext<'_>) -> JsonValue {
    let message = node
        .str_property("message")
        .map(ToString::to_string)
        .filter(|m| !m.is_empty())
        .or_else(|| Some(payload_str(ctx, "message")).filter(|m| !m.is_empty()))
        .or_else(|| Some(payload_str(ctx, "text")).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| "Manual execution started".to_string());

    debug!(node_id = %node.id, message, "manual trigger activated");

    json!({
        "main": {
            "triggered_manually": true,
            "message": message,
            "text": message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Credentials;
    use crate::handler::Services;
    use agentflow_core::WorkflowId;
    use serde_json::Map;

    async fn run(node: Node, payload: JsonValue) -> JsonValue {
        let payload = payload.as_object().cloned().unwrap_or_default();
        let credentials = Credentials::new();
        let services = Services::new();
        let mut ctx =
            HandlerContext::new(WorkflowId::new(), &payload, &credentials, &services);
        TriggerHandler
            .execute(&node, &Map::new(), &mut ctx)
            .await
            .expect("trigger")
    }

    #[tokio::test]
    async fn chat_trigger_shapes_payload() {
        let node = Node::new("t", NodeKind::WhenChatReceived)
            .with_property("channel", json!("support"));
        let result = run(
            node,
            json!({"message": "help me", "user": "ada", "timestamp": "2026-08-29T12:00:00Z"}),
        )
        .await;

        assert_eq!(result["main"]["message"], json!("help me"));
        assert_eq!(result["main"]["text"], json!("help me"));
        assert_eq!(result["main"]["user"], json!("ada"));
        assert_eq!(result["main"]["channel"], json!("support"));
    }

    #[tokio::test]
    async fn chat_trigger_defaults_anonymous_user() {
        let node = Node::new("t", NodeKind::WhenChatReceived);
        let result = run(node, json!({"message": "hi"})).await;
        assert_eq!(result["main"]["user"], json!("anonymous"));
    }

    #[tokio::test]
    async fn webhook_trigger_passes_payload_through() {
        let node = Node::new("t", NodeKind::Webhook).with_property("path", json!("/hooks/in"));
        let result = run(node, json!({"event": "push"})).await;

        assert_eq!(result["main"]["path"], json!("/hooks/in"));
        assert_eq!(result["main"]["data"], json!({"event": "push"}));
        assert!(result["main"]["text"].as_str().unwrap().contains("push"));
    }

    #[tokio::test]
    async fn manual_trigger_prefers_property_message() {
        let node =
            Node::new("t", NodeKind::ManualTrigger).with_property("message", json!("go"));
        let result = run(node, json!({"message": "ignored"})).await;
        assert_eq!(result["main"]["message"], json!("go"));
        assert_eq!(result["main"]["triggered_manually"], json!(true));
    }

    #[tokio::test]
    async fn manual_trigger_falls_back_to_payload_then_default() {
        let node = Node::new("t", NodeKind::ManualTrigger);
        let result = run(node.clone(), json!({"text": "from payload"})).await;
        assert_eq!(result["main"]["message"], json!("from payload"));

        let result = run(node, json!({})).await;
        assert_eq!(result["main"]["message"], json!("Manual execution started"));
    }

    #[tokio::test]
    async fn schedule_trigger_reports_interval() {
        let node = Node::new("t", NodeKind::Schedule)
            .with_property("interval", json!("minutes"))
            .with_property("value", json!(15));
        let result = run(node, json!({})).await;
        assert_eq!(
            result["main"]["text"],
            json!("Scheduled execution every 15 minutes")
        );
    }
}
