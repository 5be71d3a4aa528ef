//! Batch evaluation reports.
//!
//! A batch evaluation walks the ground truth entries, pairs each with an
//! extraction output, and produces one [`FileEvaluation`] per document.
//! The JSON report is the list itself; the text report adds an overall
//! summary with two aggregate metrics that answer different questions:
//! average per-file accuracy weighs every document equally, pooled
//! field-level accuracy weighs every evaluated field equally.

use serde::{Deserialize, Serialize};

use super::accuracy::{AccuracyReport, round2};

/// Per-document evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvaluation {
    /// File name as listed in the ground truth.
    pub filename: String,

    #[serde(flatten)]
    pub status: EvaluationStatus,
}

/// What happened when a document came up for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// Extraction output found and compared against ground truth.
    Evaluated { accuracy: AccuracyReport },

    /// No ground truth entry matches this document.
    NoGroundTruth,

    /// Ground truth exists but no extraction output was found.
    NoExtraction,
}

impl FileEvaluation {
    pub fn evaluated(filename: impl Into<String>, accuracy: AccuracyReport) -> Self {
        Self {
            filename: filename.into(),
            status: EvaluationStatus::Evaluated { accuracy },
        }
    }

    pub fn no_ground_truth(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: EvaluationStatus::NoGroundTruth,
        }
    }

    pub fn no_extraction(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: EvaluationStatus::NoExtraction,
        }
    }

    /// The accuracy report, when this document was actually evaluated.
    pub fn accuracy(&self) -> Option<&AccuracyReport> {
        match &self.status {
            EvaluationStatus::Evaluated { accuracy } => Some(accuracy),
            _ => None,
        }
    }
}

/// Aggregate metrics over a batch of evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub files_evaluated: usize,
    pub files_without_ground_truth: usize,
    pub files_without_extraction: usize,
    pub total_fields: usize,
    pub correct_fields: usize,

    /// Mean of per-file accuracies. Absent when nothing was evaluated.
    pub average_accuracy: Option<f64>,

    /// Pooled accuracy over every evaluated field. Absent when no field
    /// was evaluated.
    pub field_level_accuracy: Option<f64>,
}

/// Fold a batch of evaluations into aggregate metrics.
pub fn summarize(results: &[FileEvaluation]) -> EvaluationSummary {
    let mut summary = EvaluationSummary::default();
    let mut accuracy_sum = 0.0;

    for result in results {
        match &result.status {
            EvaluationStatus::Evaluated { accuracy } => {
                summary.files_evaluated += 1;
                accuracy_sum += accuracy.overall_accuracy;
                summary.total_fields += accuracy.total_fields;
                summary.correct_fields += accuracy.correct_fields;
            }
            EvaluationStatus::NoGroundTruth => summary.files_without_ground_truth += 1,
            EvaluationStatus::NoExtraction => summary.files_without_extraction += 1,
        }
    }

    if summary.files_evaluated > 0 {
        summary.average_accuracy = Some(round2(accuracy_sum / summary.files_evaluated as f64));
    }
    if summary.total_fields > 0 {
        summary.field_level_accuracy = Some(round2(
            summary.correct_fields as f64 / summary.total_fields as f64 * 100.0,
        ));
    }
    summary
}

/// Render the batch evaluation report as text.
pub fn render_report(results: &[FileEvaluation]) -> String {
    let heavy = "=".repeat(100);
    let light = "-".repeat(100);
    let mut lines: Vec<String> = Vec::new();

    lines.push(heavy.clone());
    lines.push("ELECTRICITY BILL EXTRACTION - EVALUATION REPORT".to_string());
    lines.push(heavy.clone());
    lines.push(String::new());
    lines.push("INDIVIDUAL FILE ACCURACY".to_string());
    lines.push(light.clone());
    lines.push(String::new());

    for result in results {
        lines.push(format!("File: {}", result.filename));
        match &result.status {
            EvaluationStatus::Evaluated { accuracy } => {
                lines.push(format!("  Accuracy: {:.2}%", accuracy.overall_accuracy));
                lines.push(format!(
                    "  Correct Fields: {}/{}",
                    accuracy.correct_fields, accuracy.total_fields
                ));
                lines.push(String::new());
                for (field, comparison) in &accuracy.field_results {
                    let mark = if comparison.correct { "✓" } else { "✗" };
                    lines.push(format!("    {mark} {}:", field.display_name()));
                    lines.push(format!("       Expected:  {}", comparison.expected));
                    lines.push(format!(
                        "       Extracted: {}",
                        comparison.extracted.as_deref().unwrap_or("null")
                    ));
                }
            }
            EvaluationStatus::NoGroundTruth => {
                lines.push("  Status: No ground truth available".to_string());
            }
            EvaluationStatus::NoExtraction => {
                lines.push("  Status: No extracted result found".to_string());
            }
        }
        lines.push(String::new());
        lines.push(light.clone());
        lines.push(String::new());
    }

    let summary = summarize(results);
    lines.push(String::new());
    lines.push(heavy.clone());
    lines.push("OVERALL SUMMARY".to_string());
    lines.push(heavy.clone());
    lines.push(String::new());
    lines.push(format!("Total Files Evaluated: {}", summary.files_evaluated));
    lines.push(format!("Total Fields Evaluated: {}", summary.total_fields));
    lines.push(format!("Total Correct Fields: {}", summary.correct_fields));
    lines.push(format!(
        "Total Incorrect Fields: {}",
        summary.total_fields - summary.correct_fields
    ));
    lines.push(String::new());
    match (summary.average_accuracy, summary.field_level_accuracy) {
        (Some(average), Some(field_level)) => {
            lines.push(format!("AVERAGE ACCURACY: {average:.2}%"));
            lines.push(format!("FIELD-LEVEL ACCURACY: {field_level:.2}%"));
        }
        (Some(average), None) => {
            lines.push(format!("AVERAGE ACCURACY: {average:.2}%"));
            lines.push("FIELD-LEVEL ACCURACY: N/A (no fields evaluated)".to_string());
        }
        _ => {
            lines.push("AVERAGE ACCURACY: N/A (no files evaluated)".to_string());
        }
    }
    lines.push(String::new());
    lines.push(heavy);

    lines.join("\n")
}

/// Render a single document's accuracy as text.
pub fn render_accuracy_report(report: &AccuracyReport) -> String {
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);
    let mut lines = vec![
        heavy.clone(),
        "ACCURACY REPORT".to_string(),
        heavy.clone(),
        String::new(),
        format!("Overall Accuracy: {:.2}%", report.overall_accuracy),
        format!(
            "Correct Fields: {}/{}",
            report.correct_fields, report.total_fields
        ),
        String::new(),
        light.clone(),
        "Field-Level Results:".to_string(),
        light,
    ];

    for (field, comparison) in &report.field_results {
        let status = if comparison.correct {
            "✓ CORRECT"
        } else {
            "✗ INCORRECT"
        };
        lines.push(String::new());
        lines.push(format!("{}:", field.display_name()));
        lines.push(format!("  Expected:  {}", comparison.expected));
        lines.push(format!(
            "  Extracted: {}",
            comparison.extracted.as_deref().unwrap_or("null")
        ));
        lines.push(format!("  Status:    {status}"));
    }

    lines.push(String::new());
    lines.push(heavy);
    lines.join("\n")
}
