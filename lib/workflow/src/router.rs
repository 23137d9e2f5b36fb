//! Input resolution for a node from its predecessors' stored results.

use crate::context::ExecutionContext;
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use serde_json::{Map, Value as JsonValue};

/// Resolves the input map for a node.
///
/// For each incoming edge, the producer's stored result is looked up in the
/// context. If the result is an object containing the edge's source port as
/// a key, that member is extracted; otherwise the whole result is used. The
/// value lands under the edge's target port.
///
/// Producers with no recorded result contribute nothing. An extracted
/// `null` is inserted as `null` so dead branches propagate downstream.
/// When two edges write the same target port the later edge in the list
/// wins.
#[must_use]
pub fn resolve_inputs(
    graph: &WorkflowGraph,
    node_id: &NodeId,
    context: &ExecutionContext,
) -> Map<String, JsonValue> {
    let mut inputs = Map::new();

    for (producer, edge) in graph.predecessors(node_id) {
        let Some(result) = context.node_result(&producer.id) else {
            continue;
        };
        if result.is_null() {
            continue;
        }

        let value = match result.as_object() {
            Some(ports) if ports.contains_key(&edge.source_port) => {
                ports[&edge.source_port].clone()
            }
            _ => result.clone(),
        };

        inputs.insert(edge.target_port.clone(), value);
    }

    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::graph::WorkflowGraph;
    use crate::node::{Node, NodeKind};
    use agentflow_core::WorkflowId;
    use serde_json::json;

    fn context_with_result(node_id: &str, result: JsonValue) -> ExecutionContext {
        let mut context = ExecutionContext::new(WorkflowId::new());
        context
            .node_results
            .insert(NodeId::new(node_id), result);
        context
    }

    #[test]
    fn extracts_source_port_member() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("cond", NodeKind::IfElse),
                Node::new("reply", NodeKind::RespondToChat),
            ],
            vec![Edge::new("cond", "reply").from_port("true")],
        )
        .expect("compile");
        let context =
            context_with_result("cond", json!({"true": {"field": "x"}, "false": null}));

        let inputs = resolve_inputs(&graph, &NodeId::new("reply"), &context);
        assert_eq!(inputs.get("main"), Some(&json!({"field": "x"})));
    }

    #[test]
    fn null_member_propagates_as_null() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("cond", NodeKind::IfElse),
                Node::new("reply", NodeKind::RespondToChat),
            ],
            vec![Edge::new("cond", "reply").from_port("false")],
        )
        .expect("compile");
        let context =
            context_with_result("cond", json!({"true": {"field": "x"}, "false": null}));

        let inputs = resolve_inputs(&graph, &NodeId::new("reply"), &context);
        assert_eq!(inputs.get("main"), Some(&JsonValue::Null));
    }

    #[test]
    fn whole_result_used_when_port_absent() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("src", NodeKind::EditFields),
                Node::new("sink", NodeKind::DocumentView),
            ],
            vec![Edge::new("src", "sink").from_port("missing-port")],
        )
        .expect("compile");
        let context = context_with_result("src", json!({"value": 7}));

        let inputs = resolve_inputs(&graph, &NodeId::new("sink"), &context);
        assert_eq!(inputs.get("main"), Some(&json!({"value": 7})));
    }

    #[test]
    fn unexecuted_producer_contributes_nothing() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("src", NodeKind::EditFields),
                Node::new("sink", NodeKind::DocumentView),
            ],
            vec![Edge::new("src", "sink")],
        )
        .expect("compile");
        let context = ExecutionContext::new(WorkflowId::new());

        let inputs = resolve_inputs(&graph, &NodeId::new("sink"), &context);
        assert!(inputs.is_empty());
    }

    #[test]
    fn multiple_target_ports_collected() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("model", NodeKind::ChatModel),
                Node::new("memory", NodeKind::WindowBufferMemory),
                Node::new("agent", NodeKind::AiAgent),
            ],
            vec![
                Edge::new("model", "agent").to_port("chat-model"),
                Edge::new("memory", "agent").to_port("memory"),
            ],
        )
        .expect("compile");

        let mut context = ExecutionContext::new(WorkflowId::new());
        context
            .node_results
            .insert(NodeId::new("model"), json!({"main": {"model": "gpt-4-turbo"}}));
        context
            .node_results
            .insert(NodeId::new("memory"), json!({"main": {"window_size": 20}}));

        let inputs = resolve_inputs(&graph, &NodeId::new("agent"), &context);
        assert_eq!(inputs.len(), 2);
        assert_eq!(
            inputs.get("chat-model"),
            Some(&json!({"model": "gpt-4-turbo"}))
        );
        assert_eq!(inputs.get("memory"), Some(&json!({"window_size": 20})));
    }

    #[test]
    fn duplicate_target_port_last_edge_wins() {
        let graph = WorkflowGraph::compile(
            vec![
                Node::new("first", NodeKind::EditFields),
                Node::new("second", NodeKind::EditFields),
                Node::new("sink", NodeKind::DocumentView),
            ],
            vec![Edge::new("first", "sink"), Edge::new("second", "sink")],
        )
        .expect("compile");

        let mut context = ExecutionContext::new(WorkflowId::new());
        context
            .node_results
            .insert(NodeId::new("first"), json!({"main": {"from": "first"}}));
        context
            .node_results
            .insert(NodeId::new("second"), json!({"main": {"from": "second"}}));

        let inputs = resolve_inputs(&graph, &NodeId::new("sink"), &context);
        assert_eq!(inputs.get("main"), Some(&json!({"from": "second"})));
    }
}
