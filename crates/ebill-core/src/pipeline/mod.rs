//! End-to-end bill processing.
//!
//! [`Pipeline`] wires the stages together for one document: load, OCR
//! if there is no usable embedded text, clean, extract with patterns
//! and with the model, and merge. Accuracy evaluation stays outside the
//! pipeline because ground truth is matched per batch, not per call.

pub mod observer;

pub use observer::{DebugRecorder, NullObserver, StageEvent, StageObserver};

use std::path::Path;

use ebill_services::{DocumentOcr, TextModel};
use serde::Serialize;
use tracing::info;

use crate::Result;
use crate::document::{self, LoadedDocument};
use crate::error::InputError;
use crate::extract::{MergePolicy, ModelExtraction, ModelExtractor, PatternExtractor, merge};
use crate::models::{EbillConfig, FieldSet};

/// Everything produced for one document.
#[derive(Debug, Serialize)]
pub struct BillExtraction {
    /// Final merged fields.
    pub fields: FieldSet,

    /// Pattern extractor output before merging.
    pub pattern_fields: FieldSet,

    /// Model extraction outcome before merging.
    pub model: ModelExtraction,

    /// The cleaned text both extractors ran over.
    pub ocr_text: String,
}

/// The extraction pipeline for electricity bills.
///
/// Generic over its two remote collaborators so tests can run it
/// against canned services.
pub struct Pipeline<O, M> {
    ocr: O,
    model_extractor: ModelExtractor<M>,
    patterns: PatternExtractor,
    merge_policy: MergePolicy,
    prefer_embedded_text: bool,
    min_text_length: usize,
    max_image_size: u32,
}

impl<O: DocumentOcr, M: TextModel> Pipeline<O, M> {
    pub fn new(ocr: O, model: M) -> Self {
        let defaults = EbillConfig::default();
        Self {
            ocr,
            model_extractor: ModelExtractor::new(model),
            patterns: PatternExtractor::new(),
            merge_policy: defaults.extraction.merge_policy,
            prefer_embedded_text: defaults.pdf.prefer_embedded_text,
            min_text_length: defaults.pdf.min_text_length,
            max_image_size: defaults.ocr.max_image_size,
        }
    }

    /// Build a pipeline with every knob taken from a configuration.
    pub fn from_config(ocr: O, model: M, config: &EbillConfig) -> Self {
        Self::new(ocr, model)
            .with_merge_policy(config.extraction.merge_policy)
            .with_prompt_examples(config.extraction.prompt_examples)
            .with_embedded_text(config.pdf.prefer_embedded_text, config.pdf.min_text_length)
            .with_max_image_size(config.ocr.max_image_size)
    }

    /// Which extractor wins when both produce a value.
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Include a worked example in the model prompt.
    pub fn with_prompt_examples(mut self, enabled: bool) -> Self {
        self.model_extractor = self.model_extractor.with_examples(enabled);
        self
    }

    /// Control the embedded-text shortcut for PDFs.
    pub fn with_embedded_text(mut self, prefer: bool, min_text_length: usize) -> Self {
        self.prefer_embedded_text = prefer;
        self.min_text_length = min_text_length;
        self
    }

    /// Cap on the longer image side sent to OCR.
    pub fn with_max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    /// Process one document without observation.
    pub async fn process(&self, path: &Path) -> Result<BillExtraction> {
        self.process_with(path, &NullObserver).await
    }

    /// Process one document, reporting each stage to the observer.
    pub async fn process_with(
        &self,
        path: &Path,
        observer: &dyn StageObserver,
    ) -> Result<BillExtraction> {
        let loaded =
            document::load_document(path, self.prefer_embedded_text, self.min_text_length)?;

        let raw_text = match &loaded {
            LoadedDocument::Text(text) => {
                observer.on_stage(&StageEvent::DocumentLoaded {
                    path,
                    pages: 0,
                    embedded_text: true,
                });
                text.clone()
            }
            LoadedDocument::Pages(pages) => {
                observer.on_stage(&StageEvent::DocumentLoaded {
                    path,
                    pages: pages.len(),
                    embedded_text: false,
                });
                // Multi-page bills put every labeled field on page one.
                let Some(page) = pages.first() else {
                    return Err(InputError::EmptyDocument.into());
                };
                let prepared = document::clean_page(page, self.max_image_size);
                let encoded = document::encode_png(&prepared)?;
                let text = self.ocr.recognize(&encoded).await?;
                observer.on_stage(&StageEvent::OcrComplete { raw_text: &text });
                text
            }
        };

        let text = document::clean_ocr_text(&raw_text);
        observer.on_stage(&StageEvent::TextCleaned { text: &text });

        let pattern_fields = self.patterns.extract(&text);
        observer.on_stage(&StageEvent::PatternComplete {
            fields: &pattern_fields,
        });

        let request = self.model_extractor.request_for(&text);
        observer.on_stage(&StageEvent::PromptBuilt { request: &request });
        let model = self.model_extractor.extract_request(&request).await;
        observer.on_stage(&StageEvent::ModelComplete { extraction: &model });

        let fields = merge(&pattern_fields, &model.fields, self.merge_policy);
        observer.on_stage(&StageEvent::Merged { fields: &fields });

        info!(
            path = %path.display(),
            present = fields.present_count(),
            degraded = model.outcome.is_degraded(),
            "document processed"
        );

        Ok(BillExtraction {
            fields,
            pattern_fields,
            model,
            ocr_text: text,
        })
    }
}
