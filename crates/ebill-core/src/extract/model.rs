//! Model-based field extraction.

use ebill_services::{ChatMessage, ChatRequest, TextModel, TokenUsage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::FieldSet;

use super::prompt;

/// Outcome of a model extraction attempt.
///
/// Model extraction never fails the pipeline. When the service call or
/// response parsing goes wrong the outcome is `Degraded` with an empty
/// field set, and the pattern side carries the result alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModelOutcome {
    Success,
    Degraded { reason: String },
}

impl ModelOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ModelOutcome::Degraded { .. })
    }
}

/// Result of running the model extractor over OCR text.
#[derive(Debug, Clone, Serialize)]
pub struct ModelExtraction {
    /// Fields pulled from the model response (all absent when degraded).
    pub fields: FieldSet,

    /// Whether the model answered usefully.
    #[serde(flatten)]
    pub outcome: ModelOutcome,

    /// Raw response content, kept for debug recording.
    pub raw_response: Option<String>,

    /// Model identifier reported by the service.
    pub model: Option<String>,

    /// Token usage reported by the service.
    pub usage: Option<TokenUsage>,
}

impl ModelExtraction {
    fn degraded(reason: String) -> Self {
        Self {
            fields: FieldSet::new(),
            outcome: ModelOutcome::Degraded { reason },
            raw_response: None,
            model: None,
            usage: None,
        }
    }
}

/// Extracts bill fields by prompting a generative text model.
pub struct ModelExtractor<M> {
    model: M,
    prompt_examples: bool,
}

impl<M: TextModel> ModelExtractor<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompt_examples: false,
        }
    }

    /// Include a worked example in the prompt.
    pub fn with_examples(mut self, enabled: bool) -> Self {
        self.prompt_examples = enabled;
        self
    }

    /// Build the chat request for a piece of OCR text.
    pub fn request_for(&self, ocr_text: &str) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(prompt::SYSTEM_MESSAGE),
            ChatMessage::user(prompt::user_prompt(ocr_text, self.prompt_examples)),
        ])
        .json()
    }

    /// Extract fields from OCR text.
    pub async fn extract(&self, ocr_text: &str) -> ModelExtraction {
        let request = self.request_for(ocr_text);
        self.extract_request(&request).await
    }

    /// Run a prepared request through the model.
    pub async fn extract_request(&self, request: &ChatRequest) -> ModelExtraction {
        let completion = match self.model.complete(request).await {
            Ok(completion) => completion,
            Err(error) => {
                warn!(%error, "model extraction failed");
                return ModelExtraction::degraded(error.to_string());
            }
        };

        match parse_model_response(&completion.content) {
            Ok(fields) => {
                debug!(present = fields.present_count(), "model extraction done");
                ModelExtraction {
                    fields,
                    outcome: ModelOutcome::Success,
                    raw_response: Some(completion.content),
                    model: completion.model,
                    usage: completion.usage,
                }
            }
            Err(reason) => {
                warn!(%reason, "model returned unusable JSON");
                ModelExtraction {
                    raw_response: Some(completion.content),
                    model: completion.model,
                    usage: completion.usage,
                    ..ModelExtraction::degraded(reason)
                }
            }
        }
    }
}

/// Parse a model response body into a field set.
///
/// Unknown keys are ignored and numeric values are stringified by the
/// [`FieldSet`] deserializer; anything that is not a JSON object is an
/// error described well enough to log.
pub fn parse_model_response(content: &str) -> Result<FieldSet, String> {
    serde_json::from_str(content).map_err(|e| format!("invalid JSON from model: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillField;
    use ebill_services::{Completion, ServiceError};
    use pretty_assertions::assert_eq;

    enum Canned {
        Reply(&'static str),
        Fail,
    }

    #[async_trait::async_trait]
    impl TextModel for Canned {
        async fn complete(
            &self,
            _request: &ChatRequest,
        ) -> ebill_services::Result<Completion> {
            match self {
                Canned::Reply(content) => Ok(Completion {
                    content: (*content).to_string(),
                    model: Some("test-model".to_string()),
                    usage: None,
                }),
                Canned::Fail => Err(ServiceError::Api {
                    status: 500,
                    message: "backend unavailable".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_successful_extraction() {
        let extractor = ModelExtractor::new(Canned::Reply(
            r#"{"consumer_name": "Rajesh Kumar", "units_consumed": 450, "bill_amount": null}"#,
        ));
        let extraction = extractor.extract("some ocr text").await;

        assert_eq!(extraction.outcome, ModelOutcome::Success);
        assert_eq!(
            extraction.fields.get(BillField::ConsumerName),
            Some("Rajesh Kumar")
        );
        assert_eq!(extraction.fields.get(BillField::UnitsConsumed), Some("450"));
        assert_eq!(extraction.fields.get(BillField::BillAmount), None);
        assert_eq!(extraction.model.as_deref(), Some("test-model"));
    }

    #[tokio::test]
    async fn test_service_failure_degrades() {
        let extractor = ModelExtractor::new(Canned::Fail);
        let extraction = extractor.extract("some ocr text").await;

        assert!(extraction.outcome.is_degraded());
        assert_eq!(extraction.fields.present_count(), 0);
        assert_eq!(extraction.raw_response, None);
    }

    #[tokio::test]
    async fn test_invalid_json_degrades_but_keeps_raw_response() {
        let extractor = ModelExtractor::new(Canned::Reply("not json at all"));
        let extraction = extractor.extract("some ocr text").await;

        assert!(extraction.outcome.is_degraded());
        assert_eq!(extraction.fields.present_count(), 0);
        assert_eq!(extraction.raw_response.as_deref(), Some("not json at all"));
    }

    #[test]
    fn test_request_shape() {
        let extractor = ModelExtractor::new(Canned::Fail);
        let request = extractor.request_for("OCR goes here");

        assert!(request.json_output);
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("OCR goes here"));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(parse_model_response("[1, 2, 3]").is_err());
        assert!(parse_model_response("").is_err());
        assert!(parse_model_response("{}").is_ok());
    }

    #[test]
    fn test_degraded_serialization_is_tagged() {
        let extraction = ModelExtraction::degraded("timeout".to_string());
        let json = serde_json::to_value(&extraction).unwrap();
        assert_eq!(json["outcome"], "degraded");
        assert_eq!(json["reason"], "timeout");
    }
}
