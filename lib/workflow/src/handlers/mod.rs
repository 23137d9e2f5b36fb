//! One handler per capability family, plus the helpers they share.

pub mod action;
pub mod data;
pub mod flow;
pub mod generative;
pub mod output;
pub mod trigger;

pub use action::ActionHandler;
pub use data::DataTransformHandler;
pub use flow::FlowControlHandler;
pub use generative::GenerativeHandler;
pub use output::OutputHandler;
pub use trigger::TriggerHandler;

use crate::error::NodeError;
use crate::handler::InputMap;
use crate::node::Node;
use serde_json::{Map, Value as JsonValue};

/// Errors unless `port` carries a non-null value.
pub(crate) fn require_input(node: &Node, inputs: &InputMap, port: &str) -> Result<(), NodeError> {
    match inputs.get(port) {
        Some(value) if !value.is_null() => Ok(()),
        _ => Err(NodeError::MissingInput {
            node_id: node.id.clone(),
            port: port.to_string(),
        }),
    }
}

/// Returns the object on `port`, or an empty map when the port is absent or
/// the value is not an object.
pub(crate) fn object_input(inputs: &InputMap, port: &str) -> Map<String, JsonValue> {
    inputs
        .get(port)
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Renders a JSON value as the text downstream nodes expect.
pub(crate) fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Picks the conventional text member out of a port record.
pub(crate) fn text_of(data: &Map<String, JsonValue>) -> Option<String> {
    for key in ["text", "message", "prompt"] {
        if let Some(text) = data.get(key).and_then(JsonValue::as_str)
            && !text.is_empty()
        {
            return Some(text.to_string());
        }
    }
    None
}

/// Returns true for the values the engine treats as "no data": null, an
/// empty object, or an empty string.
pub(crate) fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Evaluates one field/operator/value predicate.
///
/// String comparison is case-insensitive; the ordering operators compare
/// numerically and fail closed when either side is not a number.
pub(crate) fn evaluate_predicate(
    field_value: &JsonValue,
    operator: &str,
    expected: &JsonValue,
) -> bool {
    let field = value_to_string(field_value).to_lowercase();
    let expected_str = value_to_string(expected).to_lowercase();

    match operator {
        "equals" => field == expected_str,
        "notEquals" => field != expected_str,
        "contains" => field.contains(&expected_str),
        "greaterThan" => match (as_number(field_value), as_number(expected)) {
            (Some(left), Some(right)) => left > right,
            _ => false,
        },
        "lessThan" => match (as_number(field_value), as_number(expected)) {
            (Some(left), Some(right)) => left < right,
            _ => false,
        },
        _ => false,
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
