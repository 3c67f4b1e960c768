//! Chat-completion message model and the LLM transport seam
//!
//! Messages follow the OpenAI chat-completions wire shape so the history can
//! be sent back to the provider verbatim between rounds.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub use openai::OpenAiClient;

use crate::Result;

/// One entry in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// End-user text
    User {
        /// Message text
        content: String,
    },
    /// Model turn, optionally carrying tool invocations
    Assistant(AssistantTurn),
    /// Result of one tool invocation
    Tool {
        /// Identifier of the invocation this result answers
        tool_call_id: String,
        /// Serialized tool output
        content: String,
    },
}

impl Message {
    /// Create a `user` message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a `tool` result message
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// Assistant turn as returned by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    /// Visible content, reasoning fragments, or nothing
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: Option<MessageContent>,

    /// Pending tool invocations, in the order the model emitted them
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// Create a text-only assistant turn
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(MessageContent::Text(text.into())),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant turn that only requests tools
    #[must_use]
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    /// Whether the model asked for any tool to run
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Assistant content: a plain string or a sequence of typed fragments
///
/// Fragments are kept as raw JSON; their shape varies by provider and is
/// interpreted only by [`crate::agent::extract`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Ordered typed fragments (`text`, `reasoning`, `summary`, ...)
    Parts(Vec<serde_json::Value>),
}

impl MessageContent {
    /// Interpret an arbitrary JSON value as content
    ///
    /// Strings and arrays map to their variants, a lone object becomes a
    /// one-fragment sequence, anything else is treated as absent.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Text(s)),
            serde_json::Value::Array(parts) => Some(Self::Parts(parts)),
            obj @ serde_json::Value::Object(_) => Some(Self::Parts(vec![obj])),
            _ => None,
        }
    }
}

fn lenient_content<'de, D>(deserializer: D) -> std::result::Result<Option<MessageContent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(MessageContent::from_value(value))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A model-issued tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Invocation identifier, unique within one assistant turn
    pub id: String,
    /// Always `"function"` for chat completions
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// Function name and arguments
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a function tool call
    #[must_use]
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

fn function_type() -> String {
    "function".to_owned()
}

/// Function name plus its raw JSON arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool name
    pub name: String,
    /// Arguments as JSON text; providers that send an object are normalized
    #[serde(default, deserialize_with = "arguments_as_text")]
    pub arguments: String,
}

fn arguments_as_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Tool schema advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function declaration
    pub function: FunctionDefinition,
}

/// Function declaration inside a [`ToolDefinition`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    /// Tool name
    pub name: String,
    /// What the tool does, shown to the model
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Declare a function tool
    #[must_use]
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: function_type(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Model transport: produce the next assistant turn for a history
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Request one completion with automatic tool choice
    ///
    /// Returns `Ok(None)` when the provider answered without any turn.
    ///
    /// # Errors
    ///
    /// Returns error if the request itself fails
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Option<AssistantTurn>>;
}
