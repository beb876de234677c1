//! Core types for LLM interaction.
//!
//! These types model the data flowing between the agent runtime and a
//! chat-completion endpoint.  Requests serialize directly into the wire body;
//! replies are parsed by [`super::client::parse_reply`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions that shape model behavior.
    System,
    /// Input from the human user (and folded tool results).
    User,
    /// Output from the LLM.
    Assistant,
}

/// A single `{role, content}` message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool descriptors and calls
// ---------------------------------------------------------------------------

/// A tool exposed to the model, in function-calling wire form:
/// `{"type": "function", "function": {name, description, parameters}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

/// The `function` half of a [`ToolDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's keyword arguments.
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Build a `"function"` descriptor.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            kind: "function".to_owned(),
            function: FunctionSpec {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// The tool name.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Identifier assigned by the backend, when it sends one.
    pub id: Option<String>,
    /// The name of the tool to invoke.
    pub name: String,
    /// Arguments exactly as the backend sent them: a JSON-encoded string.
    /// Decoding happens at dispatch time so malformed input can degrade
    /// gracefully.
    pub arguments: String,
}

impl ToolCall {
    /// Create a call without a backend id.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// The `message` object of the first completion choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyMessage {
    /// Final text, if the model produced any.
    pub content: Option<String>,
    /// Tool invocations requested by the model.
    pub tool_calls: Vec<ToolCall>,
    /// Backend-specific reasoning side channel.
    pub reasoning: Option<String>,
}

impl ReplyMessage {
    /// A reply carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A reply requesting tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    /// A synthesized reply describing a backend failure.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self::text(format!("Error: {reason}"))
    }

    /// The text content, or `""` when absent.
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Chat request
// ---------------------------------------------------------------------------

/// A chat-completion request.  Serializes to
/// `{messages, temperature, max_tokens, tools?}`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The conversation, system message first.
    pub messages: Vec<Message>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens the model may generate.
    pub max_tokens: u32,

    /// Tools the model may call.  Omitted from the body when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}
