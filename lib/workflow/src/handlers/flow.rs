//! Flow control: conditionals, switches, and merges.
//!
//! Inactive branches are not pruned from the schedule; a conditional emits
//! an empty record on the non-activated output and downstream nodes carry
//! the empty data forward.

use super::{evaluate_predicate, is_empty_value, object_input, require_input};
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeKind};
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Handler for the flow-control family.
pub struct FlowControlHandler;

#[async_trait]
impl NodeHandler for FlowControlHandler {
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::IfElse => if_else(node, inputs),
            NodeKind::Switch => switch(node, inputs),
            NodeKind::Merge => merge(node, inputs),
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not a flow control node"),
            }),
        }
    }
}

fn if_else(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;
    let input_data = object_input(inputs, "main");

    let conditions = node
        .array_property("conditions")
        .filter(|conditions| !conditions.is_empty())
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no conditions defined".to_string(),
        })?;
    let combine = node.str_property("combineOperation").unwrap_or("AND");

    let mut results = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let field = condition
            .get("field")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let operator = condition
            .get("operator")
            .and_then(JsonValue::as_str)
            .unwrap_or("equals");
        let expected = condition.get("value").cloned().unwrap_or(JsonValue::Null);
        let field_value = input_data.get(field).cloned().unwrap_or(JsonValue::Null);
        results.push(evaluate_predicate(&field_value, operator, &expected));
    }

    let matched = if combine == "OR" {
        results.iter().any(|r| *r)
    } else {
        results.iter().all(|r| *r)
    };
    debug!(node_id = %node.id, matched, "conditional evaluated");

    let input_data = JsonValue::Object(input_data);
    Ok(if matched {
        json!({"true": input_data, "false": {}})
    } else {
        json!({"true": {}, "false": input_data})
    })
}

fn switch(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;
    let input_data = JsonValue::Object(object_input(inputs, "main"));

    // Rule evaluation is not wired up in the builder yet; everything goes
    // to the first output.
    debug!(node_id = %node.id, "switch routing to output0");
    Ok(json!({
        "output0": input_data,
        "output1": {},
        "output2": {},
        "output3": {},
    }))
}

fn merge(node: &Node, inputs: &InputMap) -> Result<JsonValue, NodeError> {
    let input1 = inputs.get("input1").cloned().unwrap_or(JsonValue::Null);
    let input2 = inputs.get("input2").cloned().unwrap_or(JsonValue::Null);
    let mode = node.str_property("mode").unwrap_or("append");

    match mode {
        "append" => {
            let merged: Vec<JsonValue> = [input1, input2]
                .into_iter()
                .filter(|input| !is_empty_value(input))
                .collect();
            debug!(node_id = %node.id, count = merged.len(), "merged inputs as list");
            Ok(json!({"main": {"count": merged.len(), "merged": merged}}))
        }
        "merge" => {
            let mut merged = input1.as_object().cloned().unwrap_or_default();
            if let Some(overlay) = input2.as_object() {
                for (key, value) in overlay {
                    merged.insert(key.clone(), value.clone());
                }
            }
            debug!(node_id = %node.id, "merged inputs as object");
            Ok(json!({"main": merged}))
        }
        // choose: first non-empty input.
        _ => {
            let chosen = if is_empty_value(&input1) { input2 } else { input1 };
            Ok(json!({"main": chosen}))
        }
    }
}
