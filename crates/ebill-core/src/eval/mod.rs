//! Accuracy evaluation: ground truth, comparison, and reporting.

pub mod accuracy;
pub mod ground_truth;
pub mod report;

pub use accuracy::{AccuracyReport, FieldComparison, evaluate, normalize, values_match};
pub use ground_truth::{GroundTruthEntry, MeterReading, find_entry, load_ground_truth};
pub use report::{
    EvaluationStatus, EvaluationSummary, FileEvaluation, render_accuracy_report, render_report,
    summarize,
};
