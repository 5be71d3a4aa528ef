//! Command implementations.

pub mod batch;
pub mod config;
pub mod evaluate;
pub mod process;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use indicatif::ProgressBar;

use ebill_core::EbillConfig;
use ebill_core::pipeline::{DebugRecorder, Pipeline, StageEvent, StageObserver};
use ebill_services::{GoogleVisionOcr, OpenAiChat};

/// Ground truth location used when none is given, mirroring the
/// expected/ directory convention of the sample datasets.
pub(crate) const DEFAULT_GROUND_TRUTH: &str = "expected/ground_truth.json";

/// Load configuration from an explicit path, the default location, or
/// built-in defaults.
pub(crate) fn load_config(path: Option<&str>) -> anyhow::Result<EbillConfig> {
    if let Some(path) = path {
        return EbillConfig::from_file(Path::new(path))
            .with_context(|| format!("could not load config from {path}"));
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        return EbillConfig::from_file(&default_path)
            .with_context(|| format!("could not load config from {}", default_path.display()));
    }
    Ok(EbillConfig::default())
}

/// Pick the ground truth file: the explicit flag, or the default
/// location when it exists.
pub(crate) fn resolve_ground_truth(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default = PathBuf::from(DEFAULT_GROUND_TRUTH);
        default.exists().then_some(default)
    })
}

/// Build the pipeline with both remote services configured.
///
/// Fails with every configuration problem at once when credentials are
/// missing, so the user can fix them in one round.
pub(crate) fn build_pipeline(
    config: &EbillConfig,
) -> anyhow::Result<Pipeline<GoogleVisionOcr, OpenAiChat>> {
    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.services.timeout_secs))
        .build()?;

    let mut chat = OpenAiChat::from_env()?
        .with_model(config.services.openai_model.clone())
        .with_client(client.clone());
    if let Some(base_url) = &config.services.openai_base_url {
        chat = chat.with_base_url(base_url.clone());
    }

    let mut ocr = GoogleVisionOcr::from_env()?.with_client(client);
    if let Some(endpoint) = &config.services.vision_endpoint {
        ocr = ocr.with_endpoint(endpoint.clone());
    }

    Ok(Pipeline::from_config(ocr, chat, config))
}

/// Observer that mirrors pipeline stages onto a progress bar and,
/// optionally, into a debug recorder.
pub(crate) struct CliObserver<'a> {
    bar: &'a ProgressBar,
    recorder: Option<&'a DebugRecorder>,
}

impl<'a> CliObserver<'a> {
    pub(crate) fn new(bar: &'a ProgressBar, recorder: Option<&'a DebugRecorder>) -> Self {
        Self { bar, recorder }
    }
}

impl StageObserver for CliObserver<'_> {
    fn on_stage(&self, event: &StageEvent<'_>) {
        let message = match event {
            StageEvent::DocumentLoaded {
                embedded_text: true,
                ..
            } => "Using embedded PDF text...",
            StageEvent::DocumentLoaded { .. } => "Preparing image for OCR...",
            StageEvent::OcrComplete { .. } => "Cleaning OCR text...",
            StageEvent::TextCleaned { .. } => "Matching field patterns...",
            StageEvent::PatternComplete { .. } => "Querying extraction model...",
            StageEvent::PromptBuilt { .. } => "Waiting for model response...",
            StageEvent::ModelComplete { .. } => "Merging extractions...",
            StageEvent::Merged { .. } => "Extraction complete",
            StageEvent::Evaluated { .. } => "Accuracy evaluated",
        };
        self.bar.set_message(message);
        if let Some(recorder) = self.recorder {
            recorder.on_stage(event);
        }
    }
}
