//! Stage observation hooks.
//!
//! The pipeline reports each completed stage to a [`StageObserver`].
//! Most callers pass [`NullObserver`]; the CLI's verbose mode passes a
//! [`DebugRecorder`] that snapshots every intermediate artifact to disk
//! so a bad extraction can be traced back to the stage that went wrong.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use ebill_services::ChatRequest;

use crate::eval::AccuracyReport;
use crate::extract::ModelExtraction;
use crate::models::{BillField, FieldSet};

/// A completed stage in the processing of one document.
#[derive(Debug)]
pub enum StageEvent<'a> {
    /// The document was loaded from disk.
    DocumentLoaded {
        path: &'a Path,
        /// Raster page count; zero when embedded text was used.
        pages: usize,
        /// Whether embedded PDF text short-circuited OCR.
        embedded_text: bool,
    },

    /// OCR produced raw text.
    OcrComplete { raw_text: &'a str },

    /// The raw text was cleaned for extraction.
    TextCleaned { text: &'a str },

    /// Pattern extraction finished.
    PatternComplete { fields: &'a FieldSet },

    /// The model prompt was assembled.
    PromptBuilt { request: &'a ChatRequest },

    /// Model extraction finished, possibly degraded.
    ModelComplete { extraction: &'a ModelExtraction },

    /// Pattern and model fields were merged.
    Merged { fields: &'a FieldSet },

    /// Merged fields were scored against ground truth.
    Evaluated { report: &'a AccuracyReport },
}

/// Observer notified after each pipeline stage.
pub trait StageObserver {
    fn on_stage(&self, event: &StageEvent<'_>);
}

/// Observer that ignores every event.
pub struct NullObserver;

impl StageObserver for NullObserver {
    fn on_stage(&self, _event: &StageEvent<'_>) {}
}

#[derive(Serialize)]
struct RunMetadata {
    filename: String,
    timestamp: String,
    stages: serde_json::Map<String, Value>,
}

/// Records every stage to numbered files under
/// `<output>/debug_logs/<document stem>/`.
///
/// Single-threaded by construction; recording failures are logged and
/// never interrupt the pipeline.
pub struct DebugRecorder {
    dir: PathBuf,
    metadata: RefCell<RunMetadata>,
}

impl DebugRecorder {
    /// Create the debug directory for one document.
    pub fn create(output_dir: &Path, filename: &str) -> crate::Result<Self> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        let dir = output_dir.join("debug_logs").join(stem);
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            metadata: RefCell::new(RunMetadata {
                filename: filename.to_string(),
                timestamp: now_stamp(),
                stages: serde_json::Map::new(),
            }),
        })
    }

    /// Directory the recordings land in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the metadata summary. Call once, after the last stage.
    pub fn finish(&self) -> crate::Result<()> {
        self.write_json("00_metadata.json", &*self.metadata.borrow())
    }

    /// Append a failure note for a stage that errored out.
    pub fn record_error(&self, stage: &str, error: &dyn std::fmt::Display) {
        let note = format!("[{}] {stage}: {error}\n", now_stamp());
        let path = self.dir.join("ERROR.txt");
        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        if let Err(error) = std::fs::write(&path, existing + &note) {
            warn!(%error, "could not record pipeline error");
        }
    }

    fn record(&self, event: &StageEvent<'_>) -> crate::Result<()> {
        match event {
            StageEvent::DocumentLoaded {
                path,
                pages,
                embedded_text,
            } => {
                self.note_stage(
                    "document",
                    serde_json::json!({
                        "path": path.display().to_string(),
                        "pages": pages,
                        "embedded_text": embedded_text,
                    }),
                );
                Ok(())
            }
            StageEvent::OcrComplete { raw_text } => {
                self.note_stage("raw_ocr", text_stats(raw_text));
                self.write_text("01_raw_ocr.txt", raw_text)
            }
            StageEvent::TextCleaned { text } => {
                self.note_stage("cleaned_ocr", text_stats(text));
                self.write_text("02_cleaned_ocr.txt", text)
            }
            StageEvent::PatternComplete { fields } => {
                self.note_stage("pattern_extraction", field_stats(fields));
                self.write_json("03_pattern_extraction.json", &stage_fields(fields))
            }
            StageEvent::PromptBuilt { request } => {
                let mut rendered = String::new();
                for message in &request.messages {
                    rendered.push_str(&format!("[{:?}]\n{}\n\n", message.role, message.content));
                }
                self.note_stage(
                    "model_prompt",
                    serde_json::json!({ "chars": rendered.len() }),
                );
                self.write_text("04_model_prompt.txt", rendered.trim_end())
            }
            StageEvent::ModelComplete { extraction } => {
                self.note_stage(
                    "model_response",
                    serde_json::json!({
                        "model": extraction.model,
                        "degraded": extraction.outcome.is_degraded(),
                    }),
                );
                let response = extraction
                    .raw_response
                    .as_deref()
                    .map(|raw| {
                        serde_json::from_str(raw)
                            .unwrap_or_else(|_| serde_json::json!({ "raw_text": raw }))
                    })
                    .unwrap_or(Value::Null);

                #[derive(Serialize)]
                struct ModelStageFile<'a> {
                    timestamp: String,
                    model: &'a Option<String>,
                    usage: &'a Option<ebill_services::TokenUsage>,
                    #[serde(flatten)]
                    outcome: &'a crate::extract::ModelOutcome,
                    response: Value,
                }

                self.write_json(
                    "05_model_response.json",
                    &ModelStageFile {
                        timestamp: now_stamp(),
                        model: &extraction.model,
                        usage: &extraction.usage,
                        outcome: &extraction.outcome,
                        response,
                    },
                )
            }
            StageEvent::Merged { fields } => {
                self.note_stage("final_extraction", field_stats(fields));
                self.write_json("06_final_extraction.json", &stage_fields(fields))
            }
            StageEvent::Evaluated { report } => {
                self.note_stage(
                    "accuracy_evaluation",
                    serde_json::json!({
                        "overall_accuracy": report.overall_accuracy,
                        "correct_fields": report.correct_fields,
                        "total_fields": report.total_fields,
                    }),
                );
                self.write_json(
                    "07_accuracy_evaluation.json",
                    &serde_json::json!({
                        "timestamp": now_stamp(),
                        "evaluation": report,
                    }),
                )
            }
        }
    }

    fn note_stage(&self, name: &str, entry: Value) {
        self.metadata
            .borrow_mut()
            .stages
            .insert(name.to_string(), entry);
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> crate::Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        std::fs::write(self.dir.join(name), body)?;
        Ok(())
    }

    fn write_text(&self, name: &str, content: &str) -> crate::Result<()> {
        std::fs::write(self.dir.join(name), content)?;
        Ok(())
    }
}

impl StageObserver for DebugRecorder {
    fn on_stage(&self, event: &StageEvent<'_>) {
        if let Err(error) = self.record(event) {
            warn!(%error, "debug recording failed");
        }
    }
}

fn now_stamp() -> String {
    chrono::Local::now().to_rfc3339()
}

fn text_stats(text: &str) -> Value {
    serde_json::json!({
        "char_count": text.len(),
        "line_count": text.lines().count(),
    })
}

fn field_stats(fields: &FieldSet) -> Value {
    serde_json::json!({
        "fields_found": fields.present_count(),
        "total_fields": BillField::ALL.len(),
    })
}

fn stage_fields(fields: &FieldSet) -> Value {
    serde_json::json!({
        "timestamp": now_stamp(),
        "results": fields,
        "fields_found": fields.present_count(),
        "total_fields": BillField::ALL.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillField;
    use pretty_assertions::assert_eq;

    fn sample_fields() -> FieldSet {
        let mut fields = FieldSet::new();
        fields.set(BillField::InvoiceNumber, Some("INV-001".to_string()));
        fields.set(BillField::BillAmount, Some("1450.50".to_string()));
        fields
    }

    #[test]
    fn test_recorder_writes_numbered_stage_files() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::create(dir.path(), "bill_042.pdf").unwrap();

        recorder.on_stage(&StageEvent::OcrComplete {
            raw_text: "Invoice  Number: INV-001",
        });
        recorder.on_stage(&StageEvent::TextCleaned {
            text: "Invoice Number: INV-001",
        });
        recorder.on_stage(&StageEvent::PatternComplete {
            fields: &sample_fields(),
        });
        recorder.finish().unwrap();

        let debug_dir = dir.path().join("debug_logs").join("bill_042");
        assert!(debug_dir.join("01_raw_ocr.txt").exists());
        assert!(debug_dir.join("02_cleaned_ocr.txt").exists());
        assert!(debug_dir.join("03_pattern_extraction.json").exists());

        let cleaned = std::fs::read_to_string(debug_dir.join("02_cleaned_ocr.txt")).unwrap();
        assert_eq!(cleaned, "Invoice Number: INV-001");
    }

    #[test]
    fn test_metadata_collects_stage_entries() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::create(dir.path(), "scan.png").unwrap();

        recorder.on_stage(&StageEvent::OcrComplete { raw_text: "a\nb" });
        recorder.on_stage(&StageEvent::Merged {
            fields: &sample_fields(),
        });
        recorder.finish().unwrap();

        let metadata_path = dir
            .path()
            .join("debug_logs")
            .join("scan")
            .join("00_metadata.json");
        let metadata: Value =
            serde_json::from_str(&std::fs::read_to_string(metadata_path).unwrap()).unwrap();

        assert_eq!(metadata["filename"], "scan.png");
        assert_eq!(metadata["stages"]["raw_ocr"]["line_count"], 2);
        assert_eq!(metadata["stages"]["final_extraction"]["fields_found"], 2);
    }

    #[test]
    fn test_pattern_stage_file_carries_all_field_keys() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::create(dir.path(), "bill.jpg").unwrap();

        recorder.on_stage(&StageEvent::PatternComplete {
            fields: &sample_fields(),
        });

        let stage_path = dir
            .path()
            .join("debug_logs")
            .join("bill")
            .join("03_pattern_extraction.json");
        let stage: Value =
            serde_json::from_str(&std::fs::read_to_string(stage_path).unwrap()).unwrap();

        assert_eq!(stage["fields_found"], 2);
        assert_eq!(stage["total_fields"], 12);
        assert_eq!(stage["results"]["invoice_number"], "INV-001");
        assert_eq!(stage["results"]["consumer_name"], Value::Null);
    }

    #[test]
    fn test_model_stage_file_flattens_the_outcome() {
        use crate::extract::ModelOutcome;

        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::create(dir.path(), "bill.pdf").unwrap();

        let extraction = ModelExtraction {
            fields: FieldSet::new(),
            outcome: ModelOutcome::Degraded {
                reason: "service error (503): overloaded".to_string(),
            },
            raw_response: None,
            model: None,
            usage: None,
        };
        recorder.on_stage(&StageEvent::ModelComplete {
            extraction: &extraction,
        });

        let stage_path = dir
            .path()
            .join("debug_logs")
            .join("bill")
            .join("05_model_response.json");
        let stage: Value =
            serde_json::from_str(&std::fs::read_to_string(stage_path).unwrap()).unwrap();

        assert_eq!(stage["outcome"], "degraded");
        assert_eq!(stage["reason"], "service error (503): overloaded");
        assert_eq!(stage["response"], Value::Null);
    }

    #[test]
    fn test_error_notes_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = DebugRecorder::create(dir.path(), "bill.pdf").unwrap();

        recorder.record_error("ocr", &"service timed out");
        recorder.record_error("load", &"file vanished");

        let notes = std::fs::read_to_string(recorder.dir().join("ERROR.txt")).unwrap();
        assert!(notes.contains("ocr: service timed out"));
        assert!(notes.contains("load: file vanished"));
    }
}
