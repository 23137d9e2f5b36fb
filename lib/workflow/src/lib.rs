//! Workflow graph compilation and execution.
//!
//! A workflow is a directed acyclic graph of typed nodes wired by port
//! edges. This crate compiles the node/edge lists into a validated graph,
//! derives a deterministic execution order, and runs the nodes sequentially
//! through per-family handlers, threading each node's output into its
//! successors' inputs.
//!
//! The engine is deliberately stateless between runs: callers inject the
//! external capabilities (model providers, search, HTTP, memory banks)
//! through [`Services`] and receive a finished [`ExecutionContext`] back
//! for each run.

pub mod context;
pub mod dispatcher;
pub mod edge;
pub mod engine;
pub mod error;
pub mod graph;
pub mod handler;
pub mod handlers;
pub mod node;
pub mod router;

pub use context::{
    Credentials, ExecutionContext, ExecutionReport, NodeRunState, NodeRunStatus, NodeStateReport,
    RunStatus,
};
pub use dispatcher::NodeDispatcher;
pub use edge::Edge;
pub use engine::{ExecutionRequest, WorkflowExecutionEngine};
pub use error::{NodeError, ValidationError};
pub use graph::WorkflowGraph;
pub use handler::{HandlerContext, InputMap, NodeHandler, Services};
pub use node::{Node, NodeFamily, NodeId, NodeKind};
pub use router::resolve_inputs;
