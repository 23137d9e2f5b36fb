//! Action nodes: outbound integrations.

use super::require_input;
use crate::error::NodeError;
use crate::handler::{HandlerContext, InputMap, NodeHandler};
use crate::node::{Node, NodeKind};
use agentflow_ai::HttpMethod;
use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use tracing::debug;

/// Handler for the action family.
pub struct ActionHandler;

#[async_trait]
impl NodeHandler for ActionHandler {
    async fn execute(
        &self,
        node: &Node,
        inputs: &InputMap,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<JsonValue, NodeError> {
        match node.kind {
            NodeKind::HttpRequest => http_request(node, inputs, ctx).await,
            other => Err(NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("{other} is not an action node"),
            }),
        }
    }
}

async fn http_request(
    node: &Node,
    inputs: &InputMap,
    ctx: &mut HandlerContext<'_>,
) -> Result<JsonValue, NodeError> {
    require_input(node, inputs, "main")?;

    let method: HttpMethod = node
        .str_property("method")
        .unwrap_or("GET")
        .parse()
        .map_err(|e: agentflow_ai::http::ParseMethodError| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: e.to_string(),
        })?;
    let url = node
        .str_property("url")
        .filter(|url| !url.is_empty())
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no URL specified for HTTP request".to_string(),
        })?;

    let headers = header_map(node);
    let body = request_body(node, method)?;

    let provider = ctx
        .services
        .http
        .as_ref()
        .ok_or_else(|| NodeError::Configuration {
            node_id: node.id.clone(),
            reason: "no HTTP provider configured".to_string(),
        })?;

    debug!(node_id = %node.id, %method, url, "making HTTP request");
    let response = provider
        .request(method, url, &headers, body.as_ref())
        .await
        .map_err(|e| NodeError::ExternalService {
            node_id: node.id.clone(),
            reason: e.to_string(),
        })?;
    debug!(node_id = %node.id, status = response.status_code, "HTTP request completed");

    Ok(json!({
        "main": {
            "status_code": response.status_code,
            "data": response.body,
            "headers": response.headers,
        }
    }))
}

/// Converts the `headers: [{key, value}]` property into a map.
fn header_map(node: &Node) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if let Some(entries) = node.array_property("headers") {
        for entry in entries {
            let Some(key) = entry.get("key").and_then(JsonValue::as_str) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            let value = entry
                .get("value")
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            headers.insert(key.to_string(), value.to_string());
        }
    }
    headers
}

/// Parses the `body` property for methods that carry one. A string
/// property must be valid JSON.
fn request_body(node: &Node, method: HttpMethod) -> Result<Option<JsonValue>, NodeError> {
    if matches!(method, HttpMethod::Get | HttpMethod::Delete) {
        return Ok(None);
    }
    match node.property("body") {
        Some(JsonValue::String(raw)) if !raw.trim().is_empty() => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| NodeError::Configuration {
                node_id: node.id.clone(),
                reason: format!("request body is not valid JSON: {e}"),
            }),
        Some(JsonValue::String(_)) | None => Ok(None),
        Some(other) => Ok(Some(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Credentials;
    use crate::handler::Services;
    use agentflow_ai::{HttpActionError, HttpActionProvider, HttpActionResponse};
    use agentflow_core::WorkflowId;
    use serde_json::Map;
    use std::sync::{Arc, Mutex};

    /// Records requests and returns a canned response.
    struct FakeHttpProvider {
        requests: Mutex<Vec<(HttpMethod, String, Option<JsonValue>)>>,
        fail: bool,
    }

    impl FakeHttpProvider {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl HttpActionProvider for FakeHttpProvider {
        async fn request(
            &self,
            method: HttpMethod,
            url: &str,
            _headers: &HashMap<String, String>,
            body: Option<&JsonValue>,
        ) -> Result<HttpActionResponse, HttpActionError> {
            if self.fail {
                return Err(HttpActionError::RequestFailed {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            self.requests
                .lock()
                .unwrap()
                .push((method, url.to_string(), body.cloned()));
            Ok(HttpActionResponse {
                status_code: 200,
                body: json!({"ok": true}),
                headers: HashMap::new(),
            })
        }
    }

    async fn run(node: Node, provider: Arc<FakeHttpProvider>) -> Result<JsonValue, NodeError> {
        let payload = Map::new();
        let credentials = Credentials::new();
        let services = Services::new().with_http(provider);
        let mut ctx =
            HandlerContext::new(WorkflowId::new(), &payload, &credentials, &services);
        let inputs = json!({"main": {}}).as_object().cloned().unwrap();
        ActionHandler.execute(&node, &inputs, &mut ctx).await
    }

    #[tokio::test]
    async fn request_delegates_to_provider() {
        let provider = Arc::new(FakeHttpProvider::new());
        let node = Node::new("http", NodeKind::HttpRequest)
            .with_property("method", json!("POST"))
            .with_property("url", json!("https://example.com/api"))
            .with_property("body", json!(r#"{"payload": 1}"#));

        let result = run(node, Arc::clone(&provider)).await.expect("execute");
        assert_eq!(result["main"]["status_code"], json!(200));
        assert_eq!(result["main"]["data"], json!({"ok": true}));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, HttpMethod::Post);
        assert_eq!(requests[0].2, Some(json!({"payload": 1})));
    }

    #[tokio::test]
    async fn get_request_carries_no_body() {
        let provider = Arc::new(FakeHttpProvider::new());
        let node = Node::new("http", NodeKind::HttpRequest)
            .with_property("url", json!("https://example.com"))
            .with_property("body", json!(r#"{"ignored": true}"#));

        run(node, Arc::clone(&provider)).await.expect("execute");
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].0, HttpMethod::Get);
        assert_eq!(requests[0].2, None);
    }

    #[tokio::test]
    async fn missing_url_is_misconfigured() {
        let node = Node::new("http", NodeKind::HttpRequest);
        let err = run(node, Arc::new(FakeHttpProvider::new()))
            .await
            .expect_err("error");
        assert!(matches!(err, NodeError::Configuration { .. }));
    }

    #[tokio::test]
    async fn provider_failure_is_external_service_error() {
        let node = Node::new("http", NodeKind::HttpRequest)
            .with_property("url", json!("https://example.com"));
        let err = run(node, Arc::new(FakeHttpProvider::failing()))
            .await
            .expect_err("error");
        assert!(matches!(err, NodeError::ExternalService { .. }));
    }

    #[tokio::test]
    async fn invalid_body_json_is_misconfigured() {
        let node = Node::new("http", NodeKind::HttpRequest)
            .with_property("method", json!("POST"))
            .with_property("url", json!("https://example.com"))
            .with_property("body", json!("{not json"));
        let err = run(node, Arc::new(FakeHttpProvider::new()))
            .await
            .expect_err("error");
        assert!(matches!(err, NodeError::Configuration { .. }));
    }
}
