//! Provider-neutral chat completion types.
//!
//! These mirror the OpenAI chat shape closely enough that every backend can
//! map onto them: a list of role-tagged messages in, one assistant message
//! plus token usage out.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    #[default]
    User,
    Assistant,
    Tool,
    Function,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Developer => "developer",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Function => "function",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Requested shape of the assistant output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema,
}

impl ResponseFormat {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::JsonObject => "json_object",
            ResponseFormat::JsonSchema => "json_schema",
        }
    }
}

/// A single non-streaming chat completion request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub response_format: Option<ResponseFormat>,
}

/// Token accounting reported by the provider (zeros when unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Assistant reply for a [`ChatCompletionRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatCompletionResponse {
    pub content: String,
    pub role: Role,
    pub finish_reason: String,
    pub usage: Usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let m = ChatMessage::new(Role::Developer, "x");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["role"], "developer");
        assert!(v.get("name").is_none());
    }

    #[test]
    fn role_parses_from_wire() {
        let r: Role = serde_json::from_str("\"function\"").unwrap();
        assert_eq!(r, Role::Function);
        assert_eq!(r.to_string(), "function");
    }
}
