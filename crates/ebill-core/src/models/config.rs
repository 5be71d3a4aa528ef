//! Configuration structures for the bill extraction pipeline.

use std::path::Path;

use ebill_services::{GoogleVisionOcr, OpenAiChat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::extract::MergePolicy;

/// Value shipped in sample configs; treated the same as an unset key.
const PLACEHOLDER_KEY: &str = "your-openai-api-key-here";

/// Main configuration for the ebill pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EbillConfig {
    /// External service configuration.
    pub services: ServicesConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// PDF handling configuration.
    pub pdf: PdfConfig,

    /// OCR image preparation configuration.
    pub ocr: OcrConfig,
}

impl Default for EbillConfig {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            extraction: ExtractionConfig::default(),
            pdf: PdfConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

/// External service configuration.
///
/// API keys are read from the environment (`OPENAI_API_KEY` and
/// `GOOGLE_VISION_API_KEY`) and are never written to the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Chat model used for field extraction.
    pub openai_model: String,

    /// Override for the chat completions base URL.
    pub openai_base_url: Option<String>,

    /// Override for the Vision annotate endpoint.
    pub vision_endpoint: Option<String>,

    /// Request timeout for both services, in seconds.
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            openai_model: ebill_services::DEFAULT_MODEL.to_string(),
            openai_base_url: None,
            vision_endpoint: None,
            timeout_secs: 60,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Which extractor wins when both produce a value for a field.
    pub merge_policy: MergePolicy,

    /// Include a worked example in the model prompt.
    pub prompt_examples: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::default(),
            prompt_examples: false,
        }
    }
}

/// PDF handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try to extract embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// OCR image preparation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Maximum image dimension (longer side) sent to OCR.
    pub max_image_size: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            max_image_size: 2048,
        }
    }
}

impl EbillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Check settings and required credentials.
    ///
    /// Every problem is reported at once rather than stopping at the
    /// first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut reasons: Vec<String> = [OpenAiChat::API_KEY_VAR, GoogleVisionOcr::API_KEY_VAR]
            .iter()
            .filter_map(|var| key_problem(var, std::env::var(var).ok().as_deref()))
            .collect();
        if self.services.timeout_secs == 0 {
            reasons.push("services.timeout_secs must be greater than zero".to_string());
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { reasons })
        }
    }
}

/// Describe what is wrong with a credential value, if anything.
fn key_problem(var: &str, value: Option<&str>) -> Option<String> {
    match value {
        None => Some(format!("{var} is not set")),
        Some(v) if v.trim().is_empty() => Some(format!("{var} is empty")),
        Some(v) if v.trim() == PLACEHOLDER_KEY => {
            Some(format!("{var} still holds the placeholder value"))
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EbillConfig::default();
        assert_eq!(config.services.openai_model, ebill_services::DEFAULT_MODEL);
        assert_eq!(config.services.timeout_secs, 60);
        assert_eq!(config.extraction.merge_policy, MergePolicy::ModelFirst);
        assert!(config.pdf.prefer_embedded_text);
        assert_eq!(config.pdf.min_text_length, 50);
        assert_eq!(config.ocr.max_image_size, 2048);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EbillConfig::default();
        config.services.openai_model = "gpt-4o".to_string();
        config.extraction.merge_policy = MergePolicy::PatternFirst;
        config.save(&path).unwrap();

        let loaded = EbillConfig::from_file(&path).unwrap();
        assert_eq!(loaded.services.openai_model, "gpt-4o");
        assert_eq!(loaded.extraction.merge_policy, MergePolicy::PatternFirst);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pdf": {"min_text_length": 120}}"#).unwrap();

        let loaded = EbillConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.min_text_length, 120);
        assert!(loaded.pdf.prefer_embedded_text);
        assert_eq!(loaded.ocr.max_image_size, 2048);
    }

    #[test]
    fn test_key_problem_cases() {
        assert!(key_problem("OPENAI_API_KEY", None).is_some());
        assert!(key_problem("OPENAI_API_KEY", Some("  ")).is_some());
        assert!(key_problem("OPENAI_API_KEY", Some(PLACEHOLDER_KEY)).is_some());
        assert_eq!(key_problem("OPENAI_API_KEY", Some("sk-test")), None);
    }
}
