//! External capability contracts for the agentflow platform.
//!
//! This crate defines the interfaces that workflow node handlers use to
//! reach hosted services. The engine never talks to a provider directly;
//! implementations are injected by the caller (and faked in tests):
//!
//! - **Completion**: chat-style language-model inference
//! - **Search**: query -> formatted text tools for agents
//! - **HTTP action**: outbound requests for integration nodes

pub mod completion;
pub mod error;
pub mod http;
pub mod search;

pub use completion::{
    ChatMessage, ChatRole, CompletionProvider, CompletionRequest, ModelConfig, ToolSpec,
};
pub use error::{CompletionError, HttpActionError, SearchError};
pub use http::{HttpActionProvider, HttpActionResponse, HttpMethod};
pub use search::SearchProvider;
