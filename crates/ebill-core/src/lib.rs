//! Core library for Indian electricity bill extraction.
//!
//! This crate provides:
//! - Document loading (text PDFs, scanned PDFs, raster images)
//! - OCR text cleanup and image preparation
//! - Bill field extraction with regex patterns and a generative model
//! - Merging of the two extractor outputs under a configurable policy
//! - Accuracy evaluation against ground truth, with reports

pub mod document;
pub mod error;
pub mod eval;
pub mod extract;
pub mod models;
pub mod pipeline;

pub use error::{ConfigError, EbillError, InputError, Result};
pub use models::bill::{BillField, FieldSet};
pub use models::config::EbillConfig;
pub use document::{LoadedDocument, SUPPORTED_EXTENSIONS, load_document};
pub use extract::{MergePolicy, ModelExtraction, ModelExtractor, ModelOutcome, PatternExtractor};
pub use eval::{AccuracyReport, EvaluationSummary, FileEvaluation, evaluate};
pub use pipeline::{BillExtraction, DebugRecorder, NullObserver, Pipeline, StageObserver};

/// Re-export service contracts used at the pipeline seams.
pub use ebill_services::{DocumentOcr, GoogleVisionOcr, OpenAiChat, TextModel};
