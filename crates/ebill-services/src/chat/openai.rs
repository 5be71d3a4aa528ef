//! OpenAI-compatible chat completions client.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::chat::{ChatRequest, Completion, TextModel, TokenUsage};
use crate::error::ServiceError;
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for `/chat/completions` on OpenAI-compatible services.
///
/// Every request is sent with `temperature: 0`; when the caller asks for
/// JSON output the `json_object` response format is set as well. The base
/// URL can be overridden via `OPENAI_BASE_URL` for compatible gateways.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Environment variable holding the API key.
    pub const API_KEY_VAR: &'static str = "OPENAI_API_KEY";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a client from [`Self::API_KEY_VAR`].
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(Self::API_KEY_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ServiceError::MissingCredentials(Self::API_KEY_VAR.to_string()))?;
        Ok(Self::new(key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait::async_trait]
impl TextModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": 0,
        });
        if request.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            json = request.json_output,
            "requesting chat completion"
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: extract_error_message(&text).unwrap_or(text),
            });
        }
        extract_completion(&text, &self.model)
    }
}

/// Pull the first choice's message content out of a chat-completions body.
fn extract_completion(body: &str, fallback_model: &str) -> Result<Completion> {
    let payload: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("chat response: {e}")))?;
    let content = payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ServiceError::MalformedResponse("no message content".to_string()))?;
    let model = payload
        .model
        .filter(|value| !value.trim().is_empty())
        .or_else(|| Some(fallback_model.to_string()));
    let usage = payload.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });
    Ok(Completion {
        content,
        model,
        usage,
    })
}

/// Extract the message from an OpenAI-style `{"error": {...}}` body.
fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.error?.message
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}
