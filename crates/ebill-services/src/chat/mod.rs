//! Generative text model contract.

pub mod openai;

use serde::Serialize;

use crate::Result;

/// Author role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// A single message in a chat-style prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A request for one completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Ask the service to emit a single JSON object as the completion.
    pub json_output: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            json_output: false,
        }
    }

    /// Request strict JSON-object output.
    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Token accounting reported by the service, when available.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// One completed model response.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The assistant message content.
    pub content: String,
    /// Model identifier echoed by the service.
    pub model: Option<String>,
    /// Token usage, when the service reports it.
    pub usage: Option<TokenUsage>,
}

/// Trait for generative text model services.
///
/// Callers ask for greedy decoding (temperature zero) through this
/// contract but must not assume end-to-end determinism; providers do not
/// guarantee it.
#[async_trait::async_trait]
pub trait TextModel: Send + Sync {
    /// Produce one completion for the given request.
    async fn complete(&self, request: &ChatRequest) -> Result<Completion>;
}
