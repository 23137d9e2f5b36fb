//! Bounded conversational memory for the agentflow platform.
//!
//! This crate provides the window-bounded message log shared by AI-capable
//! workflow nodes:
//!
//! - **Messages**: role-tagged, timestamped conversation entries
//! - **Scopes**: collections partitioned by (workflow, node) identity
//! - **Transient backend**: process-lifetime storage, shared across runs
//! - **Durable backend**: same contract over an injected persistence layer
//!
//! Every backend enforces the window invariant synchronously on append:
//! a collection never holds more than its configured window of messages,
//! and the oldest messages are evicted first.

pub mod durable;
pub mod error;
pub mod message;
pub mod scope;
pub mod store;

pub use durable::{DurableMemory, DurableMemoryBank, MemoryPersistence};
pub use error::MemoryError;
pub use message::{MemoryMessage, MemoryRole};
pub use scope::MemoryScope;
pub use store::{ConversationMemory, TransientMemory, TransientMemoryBank};
