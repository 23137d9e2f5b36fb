//! Workflow nodes: identity, kind registry, and configuration.
//!
//! Node kinds form a closed registry grouped into capability families. An
//! unknown kind is rejected when the node is parsed, before any run starts.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;

/// A node identifier, unique within one workflow graph.
///
/// Ids are caller-supplied (the visual builder assigns them) rather than
/// generated, so this is a plain string newtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The capability family a node kind belongs to.
///
/// The dispatcher owns one handler per family; the handler branches on the
/// specific kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeFamily {
    /// Entry points that shape the trigger payload.
    Trigger,
    /// AI-capable nodes: agents, model/memory/tool configuration.
    Generative,
    /// Conditionals, switches, and merges.
    FlowControl,
    /// Filters and field edits.
    DataTransform,
    /// Outbound integrations.
    Action,
    /// Run outputs.
    Output,
}

/// The closed registry of node kinds.
///
/// Wire names match the visual builder's node palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeKind {
    // Triggers
    WhenChatReceived,
    Webhook,
    Schedule,
    ManualTrigger,
    // Generative
    AiAgent,
    ChatModel,
    WindowBufferMemory,
    DurableMemory,
    WebSearch,
    // Flow control
    IfElse,
    Switch,
    Merge,
    // Data transforms
    Filter,
    EditFields,
    // Actions
    HttpRequest,
    // Outputs
    RespondToChat,
    DocumentView,
}

impl NodeKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WhenChatReceived => "when-chat-received",
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::ManualTrigger => "manual-trigger",
            Self::AiAgent => "ai-agent",
            Self::ChatModel => "chat-model",
            Self::WindowBufferMemory => "window-buffer-memory",
            Self::DurableMemory => "durable-memory",
            Self::WebSearch => "web-search",
            Self::IfElse => "if-else",
            Self::Switch => "switch",
            Self::Merge => "merge",
            Self::Filter => "filter",
            Self::EditFields => "edit-fields",
            Self::HttpRequest => "http-request",
            Self::RespondToChat => "respond-to-chat",
            Self::DocumentView => "document-view",
        }
    }

    /// Returns the capability family this kind belongs to.
    #[must_use]
    pub const fn family(&self) -> NodeFamily {
        match self {
            Self::WhenChatReceived | Self::Webhook | Self::Schedule | Self::ManualTrigger => {
                NodeFamily::Trigger
            }
            Self::AiAgent
            | Self::ChatModel
            | Self::WindowBufferMemory
            | Self::DurableMemory
            | Self::WebSearch => NodeFamily::Generative,
            Self::IfElse | Self::Switch | Self::Merge => NodeFamily::FlowControl,
            Self::Filter | Self::EditFields => NodeFamily::DataTransform,
            Self::HttpRequest => NodeFamily::Action,
            Self::RespondToChat | Self::DocumentView => NodeFamily::Output,
        }
    }
}

impl FromStr for NodeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "when-chat-received" => Ok(Self::WhenChatReceived),
            "webhook" => Ok(Self::Webhook),
            "schedule" => Ok(Self::Schedule),
            "manual-trigger" => Ok(Self::ManualTrigger),
            "ai-agent" => Ok(Self::AiAgent),
            "chat-model" => Ok(Self::ChatModel),
            "window-buffer-memory" => Ok(Self::WindowBufferMemory),
            "durable-memory" => Ok(Self::DurableMemory),
            "web-search" => Ok(Self::WebSearch),
            "if-else" => Ok(Self::IfElse),
            "switch" => Ok(Self::Switch),
            "merge" => Ok(Self::Merge),
            "filter" => Ok(Self::Filter),
            "edit-fields" => Ok(Self::EditFields),
            "http-request" => Ok(Self::HttpRequest),
            "respond-to-chat" => Ok(Self::RespondToChat),
            "document-view" => Ok(Self::DocumentView),
            _ => Err(ValidationError::UnknownKind {
                kind: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for NodeKind {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed unit of work in a workflow graph.
///
/// Behavior is configured through the property map; handlers read properties
/// through the typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the graph.
    pub id: NodeId,
    /// The node kind.
    pub kind: NodeKind,
    /// Human-readable label shown in the builder.
    #[serde(default)]
    pub label: String,
    /// Kind-specific configuration.
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

impl Node {
    /// Creates a node with an empty property map and the kind's wire name
    /// as its label.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: kind.as_str().to_string(),
            properties: Map::new(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Returns a property value, if set.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&JsonValue> {
        self.properties.get(key)
    }

    /// Returns a string property, if set and a string.
    #[must_use]
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(JsonValue::as_str)
    }

    /// Returns an unsigned integer property, if set and numeric.
    #[must_use]
    pub fn u64_property(&self, key: &str) -> Option<u64> {
        self.property(key).and_then(JsonValue::as_u64)
    }

    /// Returns a float property, if set and numeric.
    #[must_use]
    pub fn f64_property(&self, key: &str) -> Option<f64> {
        self.property(key).and_then(JsonValue::as_f64)
    }

    /// Returns an array property, if set and an array.
    #[must_use]
    pub fn array_property(&self, key: &str) -> Option<&Vec<JsonValue>> {
        self.property(key).and_then(JsonValue::as_array)
    }
}
