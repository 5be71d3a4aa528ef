//! Merging of pattern and model extraction results.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{BillField, FieldSet};

/// Which extractor wins when both produce a value for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Model values win, pattern values fill the gaps. Pattern captures
    /// clip at label boundaries and mangle multi-line values, while the
    /// model sees the whole text, so this is the default.
    #[default]
    ModelFirst,

    /// Pattern values win, model values fill the gaps. Deterministic
    /// output at the cost of pattern misfires taking precedence.
    PatternFirst,
}

/// Merge two extractions field by field.
///
/// Each field is taken from the preferred side when present there and
/// from the other side otherwise. Absent on both sides stays absent, so
/// the merged set never invents a value.
pub fn merge(pattern: &FieldSet, model: &FieldSet, policy: MergePolicy) -> FieldSet {
    let (preferred, fallback) = match policy {
        MergePolicy::ModelFirst => (model, pattern),
        MergePolicy::PatternFirst => (pattern, model),
    };

    let mut merged = FieldSet::new();
    for field in BillField::ALL {
        let value = if preferred.is_present(field) {
            preferred.get(field)
        } else {
            fallback.get(field)
        };
        merged.set(field, value.map(str::to_string));
    }

    debug!(
        ?policy,
        pattern = pattern.present_count(),
        model = model.present_count(),
        merged = merged.present_count(),
        "merged extractions"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(BillField, &str)]) -> FieldSet {
        let mut set = FieldSet::new();
        for (field, value) in pairs {
            set.set(*field, Some((*value).to_string()));
        }
        set
    }

    #[test]
    fn test_model_first_prefers_model_values() {
        let pattern = fields(&[
            (BillField::BillAmount, "5600.00"),
            (BillField::MeterNumber, "MTR98765432"),
        ]);
        let model = fields(&[
            (BillField::BillAmount, "5600"),
            (BillField::ConsumerName, "Rajesh Kumar"),
        ]);

        let merged = merge(&pattern, &model, MergePolicy::ModelFirst);
        assert_eq!(merged.get(BillField::BillAmount), Some("5600"));
        assert_eq!(merged.get(BillField::ConsumerName), Some("Rajesh Kumar"));
        assert_eq!(merged.get(BillField::MeterNumber), Some("MTR98765432"));
    }

    #[test]
    fn test_pattern_first_prefers_pattern_values() {
        let pattern = fields(&[(BillField::BillAmount, "5600.00")]);
        let model = fields(&[
            (BillField::BillAmount, "5600"),
            (BillField::DueDate, "15/08/2024"),
        ]);

        let merged = merge(&pattern, &model, MergePolicy::PatternFirst);
        assert_eq!(merged.get(BillField::BillAmount), Some("5600.00"));
        assert_eq!(merged.get(BillField::DueDate), Some("15/08/2024"));
    }

    #[test]
    fn test_absent_on_both_sides_stays_absent() {
        let merged = merge(&FieldSet::new(), &FieldSet::new(), MergePolicy::ModelFirst);
        assert_eq!(merged.present_count(), 0);
    }

    #[test]
    fn test_blank_preferred_value_falls_back() {
        let mut model = FieldSet::new();
        model.set(BillField::Address, Some("   ".to_string()));
        let pattern = fields(&[(BillField::Address, "12 MG Road, Pune")]);

        let merged = merge(&pattern, &model, MergePolicy::ModelFirst);
        assert_eq!(merged.get(BillField::Address), Some("12 MG Road, Pune"));
    }

    #[test]
    fn test_policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(MergePolicy::ModelFirst).unwrap(),
            serde_json::json!("model_first")
        );
        let parsed: MergePolicy = serde_json::from_str("\"pattern_first\"").unwrap();
        assert_eq!(parsed, MergePolicy::PatternFirst);
    }
}
