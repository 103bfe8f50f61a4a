//! Provider-agnostic message types for agent communication

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool call request from the LLM.
///
/// `arguments` is already parsed; callers never re-parse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One entry of a batched tool-result message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEntry {
    pub tool_call_id: String,
    pub content: String,
}

/// Payload of a tool-role message.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMessage {
    /// Answers a single tool call.
    Single {
        tool_call_id: String,
        content: Option<String>,
    },
    /// Answers every call of one tool-execution round, in call order.
    Batch(Vec<ToolResultEntry>),
}

/// A message in the conversation.
///
/// Each role only carries the fields that are valid for it, so a tool
/// message without a call id or a batch cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    User {
        content: Option<String>,
    },
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool(ToolMessage),
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: Some(content.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }

    /// Create an assistant message with tool calls
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    /// Create a single tool result message
    pub fn tool_result(call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::Tool(ToolMessage::Single {
            tool_call_id: call_id.into(),
            content: Some(result.into()),
        })
    }

    /// Create a batched tool result message
    pub fn tool_results(results: Vec<ToolResultEntry>) -> Self {
        Self::Tool(ToolMessage::Batch(results))
    }

    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    /// Text content, if the message carries any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Assistant { content, .. } => content.as_deref(),
            Self::Tool(ToolMessage::Single { content, .. }) => content.as_deref(),
            Self::Tool(ToolMessage::Batch(_)) => None,
        }
    }
}

/// Why the model stopped generating.
///
/// Provider strings are kept verbatim; unknown values land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for FinishReason {
    fn from(s: &str) -> Self {
        match s {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Accumulate another call's usage into this one.
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One model reply in provider-agnostic form.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub id: String,

    /// Text content of the response.
    pub content: Option<String>,

    /// Reason the response finished.
    pub finish_reason: FinishReason,

    /// Tool calls requested by the LLM.
    pub tool_calls: Vec<ToolCallRequest>,

    /// Token usage statistics.
    pub usage: Usage,

    /// Unmodified provider payload, for diagnostics only.
    pub raw: Value,
}

impl LlmResponse {
    /// Create a simple text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            content: Some(content.into()),
            finish_reason: FinishReason::Stop,
            tool_calls: vec![],
            usage: Usage::default(),
            raw: Value::Null,
        }
    }

    /// Create a response requesting tool execution.
    pub fn with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            id: String::new(),
            content: None,
            finish_reason: FinishReason::ToolCalls,
            tool_calls,
            usage: Usage::default(),
            raw: Value::Null,
        }
    }

    pub fn role(&self) -> Role {
        Role::Assistant
    }

    /// Check if response has tool calls.
    #[inline]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The history entry recorded for this reply.
    ///
    /// Finish reason and usage are call metadata and are not kept.
    pub fn to_message(&self) -> Message {
        Message::assistant_with_tools(self.content.clone(), self.tool_calls.clone())
    }
}
