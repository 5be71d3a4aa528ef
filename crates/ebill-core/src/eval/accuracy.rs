//! Field accuracy evaluation against expected values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{BillField, FieldSet};

/// Expected values equal to this sentinel are not evaluated.
const NOT_AVAILABLE: &str = "NA";

/// Comparison record for one evaluated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    /// Expected value, as written in the ground truth.
    pub expected: String,

    /// Extracted value, if any.
    pub extracted: Option<String>,

    /// Whether the two matched after normalization.
    pub correct: bool,
}

/// Accuracy of one document's extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Percentage of evaluated fields that matched, rounded to two
    /// decimals. Zero when nothing was evaluated.
    pub overall_accuracy: f64,
    pub correct_fields: usize,
    pub total_fields: usize,

    /// Per-field outcomes, in schema order. Skipped fields do not appear.
    pub field_results: BTreeMap<BillField, FieldComparison>,
}

/// Compare an extraction against expected values.
///
/// Only fields with a usable expected value count toward the totals:
/// absent, blank, and `"NA"` expected values are skipped entirely and
/// leave no trace in the per-field results.
pub fn evaluate(extracted: &FieldSet, expected: &FieldSet) -> AccuracyReport {
    let mut field_results = BTreeMap::new();
    let mut correct_count = 0usize;
    let mut total_count = 0usize;

    for field in BillField::ALL {
        let Some(expected_value) = expected.get(field) else {
            continue;
        };
        let trimmed = expected_value.trim();
        if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
            continue;
        }

        let extracted_value = extracted.get(field).filter(|v| !v.trim().is_empty());
        let is_correct = values_match(extracted_value, Some(expected_value));
        total_count += 1;
        if is_correct {
            correct_count += 1;
        }
        field_results.insert(
            field,
            FieldComparison {
                expected: expected_value.to_string(),
                extracted: extracted_value.map(str::to_string),
                correct: is_correct,
            },
        );
    }

    let overall_accuracy = if total_count > 0 {
        round2(correct_count as f64 / total_count as f64 * 100.0)
    } else {
        0.0
    };

    AccuracyReport {
        overall_accuracy,
        correct_fields: correct_count,
        total_fields: total_count,
        field_results,
    }
}

/// Compare two optional values with normalization.
///
/// Absent on both sides is a match, absent on one side is not. Values
/// that are only whitespace count as absent.
pub fn values_match(extracted: Option<&str>, expected: Option<&str>) -> bool {
    let extracted = extracted.filter(|v| !v.trim().is_empty());
    let expected = expected.filter(|v| !v.trim().is_empty());
    match (extracted, expected) {
        (None, None) => true,
        (Some(a), Some(b)) => normalize(a) == normalize(b),
        _ => false,
    }
}

/// Normalize a value for comparison.
///
/// Lowercases, collapses runs of whitespace, strips digit-grouping
/// commas, folds currency markers to a bare `rs`, and folds the date
/// separators `/` and `.` to `-`. The `rs.` fold has to run before the
/// dot fold, otherwise the marker would end up as `rs-`.
///
/// The dot fold makes `04.05.2024` and `04/05/2024` compare equal but
/// also means `450` and `450.0` do not; expected values should be
/// written without redundant decimals.
pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(',', "")
        .replace("rs.", "rs")
        .replace('₹', "rs")
        .replace('/', "-")
        .replace('.', "-")
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
