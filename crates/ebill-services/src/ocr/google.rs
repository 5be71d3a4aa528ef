//! Google Cloud Vision OCR client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ServiceError;
use crate::ocr::DocumentOcr;
use crate::Result;

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Client for the Vision `images:annotate` endpoint.
///
/// Uses the `DOCUMENT_TEXT_DETECTION` feature, which is tuned for dense
/// document text and preserves reading order in its full-text annotation.
#[derive(Debug, Clone)]
pub struct GoogleVisionOcr {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionOcr {
    /// Environment variable holding the API key.
    pub const API_KEY_VAR: &'static str = "GOOGLE_VISION_API_KEY";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
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

    /// Override the annotate endpoint (regional endpoints, test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait::async_trait]
impl DocumentOcr for GoogleVisionOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let body = json!({
            "requests": [{
                "image": { "content": BASE64.encode(image) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
            }]
        });

        debug!(bytes = image.len(), "sending image to Vision annotate");
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
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
        extract_document_text(&text)
    }
}

/// Pull the full-text annotation out of an `images:annotate` response body.
///
/// Vision reports per-image failures inside a 200 response, so the first
/// entry's `error` object is checked before its annotation. An image with
/// no recognizable text yields an empty string.
fn extract_document_text(body: &str) -> Result<String> {
    let payload: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("annotate response: {e}")))?;
    let first = payload
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("empty responses array".to_string()))?;
    if let Some(error) = first.error {
        return Err(ServiceError::Api {
            status: error.code.unwrap_or(0),
            message: error
                .message
                .unwrap_or_else(|| "unknown annotate error".to_string()),
        });
    }
    Ok(first
        .full_text_annotation
        .map(|annotation| annotation.text)
        .unwrap_or_default())
}

/// Extract the message from a top-level `{"error": {...}}` body.
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
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    code: Option<u16>,
    message: Option<String>,
}
