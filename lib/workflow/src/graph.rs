//! Workflow graph compilation and scheduling using petgraph.
//!
//! A graph is compiled once from the builder's flat node/edge lists, then
//! queried for the execution order (Kahn's algorithm with a deterministic
//! tie-break) or reduced to the subgraph induced by one node for partial
//! re-execution.

use crate::edge::Edge;
use crate::error::ValidationError;
use crate::node::{Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// A compiled workflow graph.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    /// The underlying directed graph. Node indices follow the original
    /// node list order, which the scheduler uses as its tie-break.
    graph: DiGraph<Node, Edge>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Compiles a node/edge set into a graph.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id or an edge references a
    /// node that does not exist.
    pub fn compile(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ValidationError> {
        let mut graph = DiGraph::new();
        let mut node_index_map = HashMap::new();

        for node in nodes {
            let node_id = node.id.clone();
            if node_index_map.contains_key(&node_id) {
                return Err(ValidationError::DuplicateNode { node_id });
            }
            let index = graph.add_node(node);
            node_index_map.insert(node_id, index);
        }

        for edge in edges {
            let (Some(&source), Some(&target)) = (
                node_index_map.get(&edge.source),
                node_index_map.get(&edge.target),
            ) else {
                return Err(ValidationError::DanglingEdge {
                    source: edge.source,
                    target: edge.target,
                });
            };
            graph.add_edge(source, target, edge);
        }

        Ok(Self {
            graph,
            node_index_map,
        })
    }

    /// Returns a reference to a node by its id.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns all nodes in original list order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the upstream neighbors of a node with the connecting edges,
    /// in original edge list order.
    pub fn predecessors(&self, node_id: &NodeId) -> Vec<(&Node, &Edge)> {
        let Some(&index) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };

        // edge_references iterates in insertion order, unlike
        // edges_directed, so duplicate target ports resolve the same way
        // on every run (last edge in the list wins).
        self.graph
            .edge_references()
            .filter(|edge| edge.target() == index)
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                Some((source, edge.weight()))
            })
            .collect()
    }

    /// Returns the downstream neighbors of a node with the connecting
    /// edges, in original edge list order.
    pub fn successors(&self, node_id: &NodeId) -> Vec<(&Node, &Edge)> {
        let Some(&index) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };

        self.graph
            .edge_references()
            .filter(|edge| edge.source() == index)
            .filter_map(|edge| {
                let target = self.graph.node_weight(edge.target())?;
                Some((target, edge.weight()))
            })
            .collect()
    }

    /// Computes the execution order via Kahn's algorithm.
    ///
    /// Nodes with no remaining dependencies are scheduled FIFO by their
    /// position in the original node list, so the order is deterministic
    /// across repeated calls on the same input.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains a cycle.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, ValidationError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|index| {
                (
                    index,
                    self.graph
                        .edges_directed(index, Direction::Incoming)
                        .count(),
                )
            })
            .collect();

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|index| in_degree[index] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.graph.node_weight(current) {
                order.push(node.id.clone());
            }

            let mut ready: Vec<NodeIndex> = Vec::new();
            for edge in self.graph.edges_directed(current, Direction::Outgoing) {
                let neighbor = edge.target();
                if let Some(degree) = in_degree.get_mut(&neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(neighbor);
                    }
                }
            }
            // petgraph walks edges newest-first; restore list-order here.
            ready.sort_unstable();
            queue.extend(ready);
        }

        if order.len() != self.graph.node_count() {
            return Err(ValidationError::CycleDetected);
        }
        Ok(order)
    }

    /// Computes the subgraph induced by `start`: all of its ancestors, the
    /// node itself, and all of its descendants, with every edge between
    /// members. Used for "execute from node N" requests.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is not in the graph.
    pub fn execution_subgraph(&self, start: &NodeId) -> Result<Self, ValidationError> {
        let &start_index =
            self.node_index_map
                .get(start)
                .ok_or_else(|| ValidationError::NodeNotFound {
                    node_id: start.clone(),
                })?;

        let mut keep: HashSet<NodeIndex> = HashSet::new();
        keep.insert(start_index);
        self.collect_reachable(start_index, Direction::Incoming, &mut keep);
        self.collect_reachable(start_index, Direction::Outgoing, &mut keep);

        let nodes: Vec<Node> = self
            .graph
            .node_indices()
            .filter(|index| keep.contains(index))
            .filter_map(|index| self.graph.node_weight(index).cloned())
            .collect();
        let edges: Vec<Edge> = self
            .graph
            .edge_references()
            .filter(|edge| keep.contains(&edge.source()) && keep.contains(&edge.target()))
            .map(|edge| edge.weight().clone())
            .collect();

        Self::compile(nodes, edges)
    }

    /// Breadth-first traversal from `start` along `direction`, adding every
    /// reached node to `visited`. Cycle-safe: already-visited nodes are not
    /// re-queued.
    fn collect_reachable(
        &self,
        start: NodeIndex,
        direction: Direction,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(current, direction) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    }
}
