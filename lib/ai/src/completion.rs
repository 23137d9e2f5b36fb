//! Chat completion provider abstraction.
//!
//! Provides a unified interface over hosted language-model APIs. The engine
//! builds a [`CompletionRequest`] from node configuration and conversation
//! memory; the provider implementation owns the wire format and any timeout
//! or retry policy.

use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Configuration for the model a completion should run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g. "gpt-4-turbo").
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Base URL of the API, if not the provider default.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key for the provider.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

impl ModelConfig {
    /// Creates a configuration with default sampling settings.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
            api_key: None,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the base URL, inferring the provider default from the model
    /// name family when none was configured.
    #[must_use]
    pub fn resolved_base_url(&self) -> Option<String> {
        if self.base_url.is_some() {
            return self.base_url.clone();
        }
        let model = self.model.as_str();
        let inferred = if model.starts_with("gpt-") {
            "https://api.openai.com/v1"
        } else if model.starts_with("claude-") {
            "https://api.anthropic.com/v1"
        } else if model.starts_with("gemini-") {
            "https://generativelanguage.googleapis.com/v1"
        } else if model.starts_with("llama-")
            || model.starts_with("mixtral-")
            || model.starts_with("gemma-")
        {
            "https://api.groq.com/openai/v1"
        } else {
            return None;
        };
        Some(inferred.to_string())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new("gpt-4-turbo")
    }
}

/// The role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// System message.
    System,
    /// Tool result message.
    Tool,
}

/// A message in a chat completion exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A tool made available to the model during a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool kind (e.g. "web-search").
    pub kind: String,
    /// Tool-specific options.
    #[serde(default)]
    pub options: JsonValue,
}

impl ToolSpec {
    /// Creates a tool spec with no options.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            options: JsonValue::Null,
        }
    }

    /// Sets tool-specific options.
    #[must_use]
    pub fn with_options(mut self, options: JsonValue) -> Self {
        self.options = options;
        self
    }
}

/// A request for a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt, if any.
    pub system: Option<String>,
    /// The user prompt for this turn.
    pub prompt: String,
    /// Conversation history preceding this turn.
    pub history: Vec<ChatMessage>,
    /// Tools the model may invoke.
    pub tools: Vec<ToolSpec>,
    /// Model configuration.
    pub model: ModelConfig,
}

impl CompletionRequest {
    /// Creates a request with just a prompt and model.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: ModelConfig) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            history: Vec::new(),
            tools: Vec::new(),
            model,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Adds conversation history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Adds tools.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }
}

/// Trait for chat completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or the response is
    /// unusable.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
