//! Request and response types shared by all LLM clients

use serde::{Deserialize, Serialize};

use super::Intent;

/// A single completion request
///
/// Each request is independent; no conversation state is carried between
/// calls. Sampling parameters are derived from `intent` inside the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction for this call
    pub system_prompt: String,

    /// Conversation messages, oldest first
    pub messages: Vec<Message>,

    /// Selects the sampling profile for this call
    pub intent: Intent,

    /// When set, the provider is asked to emit JSON conforming to this schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResponseSchema>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A JSON schema constraint for structured output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Identifier the provider echoes back (letters, digits, `_`, `-`)
    pub name: String,

    /// The JSON schema the output must conform to
    pub schema: serde_json::Value,
}

/// The provider's answer to a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text, if the provider produced any
    pub content: Option<String>,

    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Convenience constructor used heavily in tests
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: TokenUsage::default(),
        }
    }
}

/// Token accounting for a single call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
