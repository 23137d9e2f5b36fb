//! The uniform node execution contract and the services behind it.

use crate::context::Credentials;
use crate::error::NodeError;
use crate::node::Node;
use agentflow_ai::{CompletionProvider, HttpActionProvider, SearchProvider};
use agentflow_core::WorkflowId;
use agentflow_memory::{DurableMemoryBank, TransientMemoryBank};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Resolved inputs for one node, keyed by target port.
pub type InputMap = Map<String, JsonValue>;

/// External capabilities injected into the engine by the caller.
///
/// Providers are optional; a node that needs a provider the caller did not
/// configure fails with a configuration error. The transient memory bank is
/// always present so conversation history survives across runs within the
/// process.
#[derive(Clone, Default)]
pub struct Services {
    /// Language-model completion provider.
    pub completion: Option<Arc<dyn CompletionProvider>>,
    /// Web-search tool provider.
    pub search: Option<Arc<dyn SearchProvider>>,
    /// Outbound HTTP provider.
    pub http: Option<Arc<dyn HttpActionProvider>>,
    /// In-process conversation memory.
    pub memory: Arc<TransientMemoryBank>,
    /// Persistence-backed conversation memory, when configured.
    pub durable_memory: Option<Arc<DurableMemoryBank>>,
}

impl Services {
    /// Creates a service set with only the transient memory bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion provider.
    #[must_use]
    pub fn with_completion(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    /// Sets the search provider.
    #[must_use]
    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    /// Sets the HTTP action provider.
    #[must_use]
    pub fn with_http(mut self, provider: Arc<dyn HttpActionProvider>) -> Self {
        self.http = Some(provider);
        self
    }

    /// Sets the durable memory bank.
    #[must_use]
    pub fn with_durable_memory(mut self, bank: Arc<DurableMemoryBank>) -> Self {
        self.durable_memory = Some(bank);
        self
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("completion", &self.completion.is_some())
            .field("search", &self.search.is_some())
            .field("http", &self.http.is_some())
            .field("durable_memory", &self.durable_memory.is_some())
            .finish_non_exhaustive()
    }
}

/// Per-node view of the run handed to a handler.
///
/// Built fresh by the engine for every node; `chat_response` is collected
/// back into the execution context after the handler returns.
pub struct HandlerContext<'a> {
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// The payload that triggered the run.
    pub trigger_payload: &'a Map<String, JsonValue>,
    /// Caller-supplied credential bag.
    pub credentials: &'a Credentials,
    /// Injected external capabilities.
    pub services: &'a Services,
    /// Set by output nodes to surface a chat-style response to the caller.
    pub chat_response: Option<String>,
}

impl<'a> HandlerContext<'a> {
    /// Creates a context for one node execution.
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        trigger_payload: &'a Map<String, JsonValue>,
        credentials: &'a Credentials,
        services: &'a Services,
    ) -> Self {
        Self {
            workflow_id,
            trigger_payload,
            credentials,
            services,
            chat_response: None,
        }
    }
}

/// The execute contract implemented by every handler family.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Executes a node against its resolved inputs.
    ///
    /// The returned value is the node's result, usually an object keyed by
    /// output port names.
    ///
    /// # Errors
    ///
    /// Returns an error when a required input, property, credential, or
    /// provider is missing, or when an external call fails. The engine
    /// records the error and aborts the run.
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError>;
}
