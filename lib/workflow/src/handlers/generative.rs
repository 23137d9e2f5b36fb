//! Generative nodes: model-backed agents and their attachments.
//!
//! Attachment nodes (chat models, memory configurations, tools) do not call
//! any service themselves; they emit configuration records that an agent
//! node consumes through its auxiliary ports.

use super::{object_input, require_input, text_of};
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeId, NodeKind};
use agentflow_ai::{ChatMessage, ChatRole, CompletionRequest, ModelConfig, ToolSpec};
use agentflow_memory::{ConversationMemory, MemoryRole, MemoryScope};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue, json};
use tracing::debug;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_WINDOW_SIZE: usize = 20;

/// Handler for the generative family.
pub struct GenerativeHandler;

#[async_trait]
impl NodeHandler for GenerativeHandler {
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::AiAgent => ai_agent(node, inputs, ctx).await,
            NodeKind::ChatModel => chat_model(node, ctx),
            NodeKind::WindowBufferMemory => Ok(window_buffer_memory(node)),
            NodeKind::DurableMemory => durable_memory(node, ctx),
            NodeKind::WebSearch => web_search(node, inputs, ctx).await,
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not a generative node"),
            }),
        }
    }
}

/// Credential key for the model's hosting provider, by model name family.
fn credential_key(model: &str) -> &'static str {
    if model.starts_with("claude-") {
        "anthropic_api_key"
    } else if model.starts_with("gemini-") {
        "google_api_key"
    } else if model.starts_with("llama-") || model.starts_with("mixtral-") || model.starts_with("gemma-")
    {
        "groq_api_key"
    } else {
        "openai_api_key"
    }
}

fn memory_error(node_id: &NodeId, e: impl std::fmt::Display) -> NodeError {
    NodeError::Memory {
        node_id: node_id.clone(),
        reason: e.to_string(),
    }
}

/// Opens the conversation memory an agent is configured with.
///
/// The `memory` port carries a configuration record from an attached memory
/// node; an agent without one still keeps a transient window of the default
/// size, so conversations survive across runs within the process.
async fn open_memory(
    node: &Node,
    config: &Map<String, JsonValue>,
    ctx: &HandlerContext<'_>,
) -> Result<Box<dyn ConversationMemory>, NodeError> {
    let window_size = config
        .get("window_size")
        .and_then(JsonValue::as_u64)
        .map_or(DEFAULT_WINDOW_SIZE, |w| w as usize);
    let scope = MemoryScope::new(ctx.workflow_id, node.id.as_str());

    let kind = config.get("type").and_then(JsonValue::as_str).unwrap_or("transient");
    if kind == "durable" {
        let bank = ctx
            .services
            .durable_memory
            .as_ref()
            .ok_or_else(|| NodeError::Configuration {
                node_id: node.id.clone(),
                reason: "no durable memory bank configured".to_string(),
            })?;
        let memory = bank
            .open(&scope, window_size)
            .await
            .map_err(|e| memory_error(&node.id, e))?;
        Ok(Box::new(memory))
    } else {
        let memory = ctx
            .services
            .memory
            .collection(&scope, window_size)
            .map_err(|e| memory_error(&node.id, e))?;
        Ok(Box::new(memory))
    }
}

/// Tool specs from the agent's `tools` port: a single attachment's record or
/// a merged array of them.
fn tool_specs(inputs: &InputMap) -> Vec<ToolSpec> {
    let Some(value) = inputs.get("tools") else {
        return Vec::new();
    };
    let entries: Vec<&JsonValue> = match value {
        JsonValue::Array(entries) => entries.iter().collect(),
        other => vec![other],
    };
    entries
        .into_iter()
        .filter_map(|entry| {
            let kind = entry.get("tool_type").and_then(JsonValue::as_str)?;
            Some(ToolSpec::new(kind).with_options(entry.clone()))
        })
        .collect()
}

async fn ai_agent(
    node: &Node,
    inputs: &InputMap,
    ctx: &mut HandlerContext<'_>,
) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;
    let main = object_input(inputs, "main");
    let prompt = text_of(&main).ok_or_else(|| NodeError::Configuration {
        node_id: node.id.clone(),
        reason: "no prompt provided".to_string(),
    })?;
    let system = node
        .str_property("prompt")
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string();

    // Model configuration from the chat-model port, defaults otherwise.
    let model_input = object_input(inputs, "chat-model");
    let mut model: ModelConfig = if model_input.is_empty() {
        ModelConfig::default()
    } else {
        serde_json::from_value(JsonValue::Object(model_input)).map_err(|e| {
            NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("invalid model configuration: {e}"),
            }
        })?
    };
    if model.api_key.is_none() {
        let key = credential_key(&model.model);
        let api_key = ctx
            .credentials
            .get_str(key)
            .ok_or_else(|| NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("no credential {key} for model {}", model.model),
            })?;
        model.api_key = Some(api_key.to_string());
    }

    let memory = open_memory(node, &object_input(inputs, "memory"), ctx).await?;
    let history: Vec<ChatMessage> = memory
        .messages()
        .await
        .map_err(|e| memory_error(&node.id, e))?
        .into_iter()
        .map(|m| ChatMessage {
            role: match m.role {
                MemoryRole::User => ChatRole::User,
                MemoryRole::Assistant => ChatRole::Assistant,
                MemoryRole::System => ChatRole::System,
                MemoryRole::Tool => ChatRole::Tool,
            },
            content: m.content,
        })
        .collect();

    let provider = ctx
        .services
        .completion
        .as_ref()
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no completion provider configured".to_string(),
        })?;

    let request = CompletionRequest::new(prompt.clone(), model.clone())
        .with_system(system)
        .with_history(history)
        .with_tools(tool_specs(inputs));

    debug!(node_id = %node.id, model = %model.model, "requesting completion");
    let response = provider
        .complete(&request)
        .await
        .map_err(|e| NodeError::ExternalService {
            node_id: node.id.clone(),
            reason: e.to_string(),
        })?;

    memory
        .append(MemoryRole::User, &prompt)
        .await
        .map_err(|e| memory_error(&node.id, e))?;
    memory
        .append(MemoryRole::Assistant, &response)
        .await
        .map_err(|e| memory_error(&node.id, e))?;

    Ok(json!({
        "main": {
            "text": response,
            "prompt": prompt,
            "model": model.model,
            "temperature": model.temperature,
        }
    }))
}

/// Emits the model configuration record an agent consumes on its chat-model
/// port.
fn chat_model(node: &Node, ctx: &HandlerContext<'_>) -> Result<JsonValue, NodeError> {
    let model = node.str_property("model").unwrap_or("gpt-4-turbo");
    let mut config = ModelConfig::new(model);
    if let Some(temperature) = node.f64_property("temperature") {
        config.temperature = temperature;
    }
    if let Some(max_tokens) = node.u64_property("max_tokens") {
        config.max_tokens = max_tokens as u32;
    }
    config.base_url = config.resolved_base_url();
    config.api_key = node
        .str_property("api_key")
        .map(ToString::to_string)
        .or_else(|| {
            ctx.credentials
                .get_str(credential_key(model))
                .map(ToString::to_string)
        });

    debug!(node_id = %node.id, model, "chat model configured");
    let config = serde_json::to_value(config).map_err(|e| NodeError::Configuration {
        node_id: node.id.clone(),
        reason: e.to_string(),
    })?;
    Ok(json!({"main": config}))
}

fn window_buffer_memory(node: &Node) -> JsonValue {
    let window_size = node
        .u64_property("windowSize")
        .unwrap_or(DEFAULT_WINDOW_SIZE as u64);
    json!({"main": {"type": "transient", "window_size": window_size}})
}

fn durable_memory(node: &Node, ctx: &HandlerContext<'_>) -> Result<JsonValue, NodeError> {
    if ctx.services.durable_memory.is_none() {
        return Err(NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no durable memory bank configured".to_string(),
        });
    }
    let window_size = node
        .u64_property("windowSize")
        .unwrap_or(DEFAULT_WINDOW_SIZE as u64);
    Ok(json!({"main": {"type": "durable", "window_size": window_size}}))
}

/// With a main input, runs a search; without one, emits the tool record an
/// agent consumes on its tools port.
async fn web_search(
    node: &Node,
    inputs: &InputMap,
    ctx: &mut HandlerContext<'_>,
) -> Result<JsonValue, NodeError> {
    let max_results = node.u64_property("maxResults").unwrap_or(5) as usize;
    let region = node.str_property("region").unwrap_or("us-en");

    let query = inputs
        .get("main")
        .and_then(JsonValue::as_object)
        .and_then(text_of);
    let Some(query) = query else {
        return Ok(json!({
            "main": {
                "tool_type": "web-search",
                "maxResults": max_results,
                "region": region,
                "node_type": "tool",
            }
        }));
    };

    let provider = ctx
        .services
        .search
        .as_ref()
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no search provider configured".to_string(),
        })?;

    debug!(node_id = %node.id, query, max_results, "running web search");
    let results = provider
        .search(&query, max_results, region)
        .await
        .map_err(|e| NodeError::ExternalService {
            node_id: node.id.clone(),
            reason: e.to_string(),
        })?;

    Ok(json!({"main": {"query": query, "text": results}}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Credentials;
    use crate::handler::Services;
    use agentflow_ai::{CompletionError, CompletionProvider, SearchError, SearchProvider};
    use agentflow_core::WorkflowId;
    use std::sync::{Arc, Mutex};

    /// Records requests and replies with a canned completion.
    struct FakeCompletion {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeCompletion {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(format!("echo: {}", request.prompt))
        }
    }

    struct FakeSearch;

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(
            &self,
            query: &str,
            max_results: usize,
            _region: &str,
        ) -> Result<String, SearchError> {
            Ok(format!("{max_results} results for {query}"))
        }
    }

    fn services_with_completion(fake: Arc<FakeCompletion>) -> Services {
        Services::new().with_completion(fake)
    }

    fn credentials() -> Credentials {
        Credentials::new().with("openai_api_key", "sk-test")
    }

    async fn run(
        node: &Node,
        inputs: JsonValue,
        services: &Services,
        credentials: &Credentials,
        workflow_id: WorkflowId,
    ) -> Result<JsonValue, NodeError> {
        let payload = Map::new();
        let mut ctx = HandlerContext::new(workflow_id, &payload, credentials, services);
        let inputs = inputs.as_object().cloned().unwrap_or_default();
        GenerativeHandler.execute(node, &inputs, &mut ctx).await
    }

    #[tokio::test]
    async fn agent_completes_prompt() {
        let fake = Arc::new(FakeCompletion::new());
        let services = services_with_completion(Arc::clone(&fake));
        let node = Node::new("agent", NodeKind::AiAgent);

        let result = run(
            &node,
            json!({"main": {"text": "hello"}}),
            &services,
            &credentials(),
            WorkflowId::new(),
        )
        .await
        .expect("execute");

        assert_eq!(result["main"]["text"], json!("echo: hello"));
        assert_eq!(result["main"]["prompt"], json!("hello"));
        assert_eq!(result["main"]["model"], json!("gpt-4-turbo"));

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests[0].system.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(requests[0].model.api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn agent_uses_attached_model_config() {
        let fake = Arc::new(FakeCompletion::new());
        let services = services_with_completion(Arc::clone(&fake));
        let node = Node::new("agent", NodeKind::AiAgent);

        run(
            &node,
            json!({
                "main": {"text": "hi"},
                "chat-model": {"model": "claude-3-sonnet", "temperature": 0.2, "api_key": "sk-model"},
            }),
            &services,
            &Credentials::new(),
            WorkflowId::new(),
        )
        .await
        .expect("execute");

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests[0].model.model, "claude-3-sonnet");
        assert!((requests[0].model.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(requests[0].model.api_key.as_deref(), Some("sk-model"));
    }

    #[tokio::test]
    async fn agent_without_credential_is_misconfigured() {
        let services = services_with_completion(Arc::new(FakeCompletion::new()));
        let node = Node::new("agent", NodeKind::AiAgent);

        let err = run(
            &node,
            json!({"main": {"text": "hi"}}),
            &services,
            &Credentials::new(),
            WorkflowId::new(),
        )
        .await
        .expect_err("error");
        assert!(matches!(err, NodeError::Configuration { .. }));
    }

    #[tokio::test]
    async fn agent_without_provider_is_misconfigured() {
        let services = Services::new();
        let node = Node::new("agent", NodeKind::AiAgent);
        let err = run(
            &node,
            json!({"main": {"text": "hi"}}),
            &services,
            &credentials(),
            WorkflowId::new(),
        )
        .await
        .expect_err("error");
        assert!(matches!(err, NodeError::Configuration { ref reason, .. }
            if reason.contains("completion provider")));
    }

    #[tokio::test]
    async fn agent_carries_history_across_runs() {
        let fake = Arc::new(FakeCompletion::new());
        let services = services_with_completion(Arc::clone(&fake));
        let node = Node::new("agent", NodeKind::AiAgent);
        let workflow_id = WorkflowId::new();
        let credentials = credentials();

        run(
            &node,
            json!({"main": {"text": "first"}}),
            &services,
            &credentials,
            workflow_id,
        )
        .await
        .expect("first run");
        run(
            &node,
            json!({"main": {"text": "second"}}),
            &services,
            &credentials,
            workflow_id,
        )
        .await
        .expect("second run");

        let requests = fake.requests.lock().unwrap();
        assert!(requests[0].history.is_empty());
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].history[0].content, "first");
        assert_eq!(requests[1].history[1].content, "echo: first");
    }

    #[tokio::test]
    async fn agent_forwards_tool_specs() {
        let fake = Arc::new(FakeCompletion::new());
        let services = services_with_completion(Arc::clone(&fake));
        let node = Node::new("agent", NodeKind::AiAgent);

        run(
            &node,
            json!({
                "main": {"text": "search please"},
                "tools": {"tool_type": "web-search", "maxResults": 3, "node_type": "tool"},
            }),
            &services,
            &credentials(),
            WorkflowId::new(),
        )
        .await
        .expect("execute");

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].kind, "web-search");
    }

    #[tokio::test]
    async fn chat_model_emits_config_record() {
        let services = Services::new();
        let node = Node::new("model", NodeKind::ChatModel)
            .with_property("model", json!("llama-3.1-8b-instant"))
            .with_property("temperature", json!(0.1));
        let credentials = Credentials::new().with("groq_api_key", "gsk-test");

        let result = run(&node, json!({}), &services, &credentials, WorkflowId::new())
            .await
            .expect("execute");
        assert_eq!(result["main"]["model"], json!("llama-3.1-8b-instant"));
        assert_eq!(
            result["main"]["base_url"],
            json!("https://api.groq.com/openai/v1")
        );
        assert_eq!(result["main"]["api_key"], json!("gsk-test"));
    }

    #[tokio::test]
    async fn memory_nodes_emit_configuration() {
        let services = Services::new();
        let node = Node::new("mem", NodeKind::WindowBufferMemory)
            .with_property("windowSize", json!(8));
        let result = run(&node, json!({}), &services, &Credentials::new(), WorkflowId::new())
            .await
            .expect("execute");
        assert_eq!(
            result["main"],
            json!({"type": "transient", "window_size": 8})
        );

        let node = Node::new("mem", NodeKind::DurableMemory);
        let err = run(&node, json!({}), &services, &Credentials::new(), WorkflowId::new())
            .await
            .expect_err("error");
        assert!(matches!(err, NodeError::Configuration { .. }));
    }

    #[tokio::test]
    async fn web_search_runs_query_with_input() {
        let services = Services::new().with_search(Arc::new(FakeSearch));
        let node = Node::new("search", NodeKind::WebSearch).with_property("maxResults", json!(3));

        let result = run(
            &node,
            json!({"main": {"text": "rust workflows"}}),
            &services,
            &Credentials::new(),
            WorkflowId::new(),
        )
        .await
        .expect("execute");
        assert_eq!(result["main"]["text"], json!("3 results for rust workflows"));
    }

    #[tokio::test]
    async fn web_search_without_input_is_a_tool_record() {
        let services = Services::new();
        let node = Node::new("search", NodeKind::WebSearch);
        let result = run(&node, json!({}), &services, &Credentials::new(), WorkflowId::new())
            .await
            .expect("execute");
        assert_eq!(result["main"]["tool_type"], json!("web-search"));
        assert_eq!(result["main"]["node_type"], json!("tool"));
    }
}
