//! Core domain types for the agentflow workflow platform.
//!
//! This crate provides the strongly-typed identifiers shared by the
//! workflow engine, memory store, and AI capability crates.

pub mod id;

pub use id::{ExecutionId, ParseIdError, WorkflowId};
