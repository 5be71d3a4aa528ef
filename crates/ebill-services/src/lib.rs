//! External service contracts for ebill.
//!
//! The extraction pipeline delegates two jobs to remote collaborators and
//! this crate pins down their interfaces:
//! - [`DocumentOcr`] — encoded raster image in, recognized plain text out
//! - [`TextModel`] — chat-style prompt in, one completion out
//!
//! Thin HTTP implementations are included for Google Cloud Vision
//! ([`GoogleVisionOcr`]) and OpenAI-compatible chat endpoints
//! ([`OpenAiChat`]). Response parsing lives in plain functions so it can
//! be tested without a network.

mod chat;
mod error;
mod ocr;

pub use chat::openai::{DEFAULT_MODEL, OpenAiChat};
pub use chat::{ChatMessage, ChatRequest, ChatRole, Completion, TextModel, TokenUsage};
pub use error::ServiceError;
pub use ocr::DocumentOcr;
pub use ocr::google::GoogleVisionOcr;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
