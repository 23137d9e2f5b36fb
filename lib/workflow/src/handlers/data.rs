//! Data transforms: filtering and field edits.

use super::{evaluate_predicate, object_input, require_input};
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeKind};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Handler for the data-transform family.
pub struct DataTransformHandler;

#[async_trait]
impl NodeHandler for DataTransformHandler {
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::Filter => filter(node, inputs),
            NodeKind::EditFields => edit_fields(node, inputs),
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not a data transform node"),
            }),
        }
    }
}

/// Passes the input through unchanged when the predicate holds, else emits
/// an empty record, the same dead-branch pattern as a conditional's
/// inactive output.
fn filter(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;
    let input_data = object_input(inputs, "main");

    let field = node
        .str_property("field")
        .filter(|field| !field.is_empty())
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no field specified for filter".to_string(),
        })?;
    let operator = node.str_property("operator").unwrap_or("equals");
    let expected = node.property("value").cloned().unwrap_or(JsonValue::Null);

    let field_value = input_data.get(field).cloned().unwrap_or(JsonValue::Null);
    let keep = evaluate_predicate(&field_value, operator, &expected);
    debug!(node_id = %node.id, field, operator, keep, "filter evaluated");

    Ok(if keep {
        json!({"main": input_data})
    } else {
        json!({"main": {}})
    })
}

/// Applies `fields: [{key, value}]` as member upserts on the input object.
fn edit_fields(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;
    let mut input_data = object_input(inputs, "main");

    let field_count = node.array_property("fields").map_or(0, |fields| {
        let mut applied = 0;
        for field in fields {
            let Some(key) = field.get("key").and_then(JsonValue::as_str) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            let value = field.get("value").cloned().unwrap_or(JsonValue::Null);
            input_data.insert(key.to_string(), value);
            applied += 1;
        }
        applied
    });
    debug!(node_id = %node.id, field_count, "edited fields");

    Ok(json!({"main": input_data}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Credentials;
    use crate::handler::Services;
    use agentflow_core::WorkflowId;
    use serde_json::Map;

    async fn run(node: Node, inputs: JsonValue) -> Result<JsonValue, NodeError> {
        let payload = Map::new();
        let credentials = Credentials::new();
        let services = Services::new();
        let mut ctx =
            HandlerContext::new(WorkflowId::new(), &payload, &credentials, &services);
        let inputs = inputs.as_object().cloned().unwrap_or_default();
        DataTransformHandler.execute(&node, &inputs, &mut ctx).await
    }

    #[tokio::test]
    async fn filter_passes_matching_input() {
        let node = Node::new("f", NodeKind::Filter)
            .with_property("field", json!("status"))
            .with_property("operator", json!("equals"))
            .with_property("value", json!("open"));

        let result = run(node, json!({"main": {"status": "open", "id": 3}}))
            .await
            .expect("execute");
        assert_eq!(result["main"], json!({"status": "open", "id": 3}));
    }

    #[tokio::test]
    async fn filter_emits_empty_record_when_predicate_fails() {
        let node = Node::new("f", NodeKind::Filter)
            .with_property("field", json!("status"))
            .with_property("value", json!("open"));

        let result = run(node, json!({"main": {"status": "closed"}}))
            .await
            .expect("execute");
        assert_eq!(result["main"], json!({}));
    }

    #[tokio::test]
    async fn filter_without_field_is_misconfigured() {
        let node = Node::new("f", NodeKind::Filter);
        let err = run(node, json!({"main": {}})).await.expect_err("error");
        assert!(matches!(err, NodeError::Configuration { .. }));
    }

    #[tokio::test]
    async fn edit_fields_upserts_members() {
        let node = Node::new("e", NodeKind::EditFields).with_property(
            "fields",
            json!([
                {"key": "status", "value": "handled"},
                {"key": "priority", "value": 1},
                {"key": "", "value": "skipped"},
            ]),
        );

        let result = run(node, json!({"main": {"status": "new", "id": 9}}))
            .await
            .expect("execute");
        assert_eq!(
            result["main"],
            json!({"status": "handled", "id": 9, "priority": 1})
        );
    }

    #[tokio::test]
    async fn edit_fields_without_fields_passes_through() {
        let node = Node::new("e", NodeKind::EditFields);
        let result = run(node, json!({"main": {"id": 1}})).await.expect("execute");
        assert_eq!(result["main"], json!({"id": 1}));
    }
}
