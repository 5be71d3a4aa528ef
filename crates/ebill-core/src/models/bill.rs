//! The bill field schema.
//!
//! Every stage of the pipeline (pattern extraction, model extraction,
//! merging, ground truth comparison, serialization) works against this
//! one definition, so the set of fields cannot drift between stages.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The fields extracted from an electricity bill.
///
/// Declaration order is canonical: serialized objects, prompts and
/// reports all list fields in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillField {
    InvoiceNumber,
    ConsumerName,
    ConsumerNumber,
    MeterNumber,
    BillingPeriod,
    PreviousReadingDate,
    CurrentReadingDate,
    UnitsConsumed,
    BillAmount,
    DueDate,
    Address,
    Discom,
}

impl BillField {
    /// All fields in canonical order.
    pub const ALL: [BillField; 12] = [
        BillField::InvoiceNumber,
        BillField::ConsumerName,
        BillField::ConsumerNumber,
        BillField::MeterNumber,
        BillField::BillingPeriod,
        BillField::PreviousReadingDate,
        BillField::CurrentReadingDate,
        BillField::UnitsConsumed,
        BillField::BillAmount,
        BillField::DueDate,
        BillField::Address,
        BillField::Discom,
    ];

    /// Snake_case name used in JSON documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillField::InvoiceNumber => "invoice_number",
            BillField::ConsumerName => "consumer_name",
            BillField::ConsumerNumber => "consumer_number",
            BillField::MeterNumber => "meter_number",
            BillField::BillingPeriod => "billing_period",
            BillField::PreviousReadingDate => "previous_reading_date",
            BillField::CurrentReadingDate => "current_reading_date",
            BillField::UnitsConsumed => "units_consumed",
            BillField::BillAmount => "bill_amount",
            BillField::DueDate => "due_date",
            BillField::Address => "address",
            BillField::Discom => "discom",
        }
    }

    /// Human-readable name used in text reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            BillField::InvoiceNumber => "Invoice Number",
            BillField::ConsumerName => "Consumer Name",
            BillField::ConsumerNumber => "Consumer Number",
            BillField::MeterNumber => "Meter Number",
            BillField::BillingPeriod => "Billing Period",
            BillField::PreviousReadingDate => "Previous Reading Date",
            BillField::CurrentReadingDate => "Current Reading Date",
            BillField::UnitsConsumed => "Units Consumed",
            BillField::BillAmount => "Bill Amount",
            BillField::DueDate => "Due Date",
            BillField::Address => "Address",
            BillField::Discom => "DISCOM",
        }
    }

    /// One-line description used by the model prompt.
    pub fn description(&self) -> &'static str {
        match self {
            BillField::InvoiceNumber => "Invoice/bill/receipt number (alphanumeric)",
            BillField::ConsumerName => "Full name of the consumer",
            BillField::ConsumerNumber => "Consumer/account number (alphanumeric)",
            BillField::MeterNumber => "Electricity meter number",
            BillField::BillingPeriod => "Billing period (date range)",
            BillField::PreviousReadingDate => "Previous meter reading date",
            BillField::CurrentReadingDate => "Current meter reading date",
            BillField::UnitsConsumed => "Total units consumed (number)",
            BillField::BillAmount => "Total bill amount (number, without currency symbol)",
            BillField::DueDate => "Payment due date",
            BillField::Address => "Consumer address",
            BillField::Discom => "Distribution company name",
        }
    }

    /// Parse a snake_case field name.
    pub fn from_name(name: &str) -> Option<Self> {
        BillField::ALL.iter().copied().find(|field| field.as_str() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BillField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete set of bill fields, one optional value per [`BillField`].
///
/// Stages hand over full sets: an absent field is `None`, never a
/// missing key. Serializes as a JSON object carrying every field in
/// canonical order, as string or null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    values: [Option<String>; BillField::ALL.len()],
}

impl FieldSet {
    /// Create a set with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, `None` when absent.
    pub fn get(&self, field: BillField) -> Option<&str> {
        self.values[field.index()].as_deref()
    }

    /// Set or clear a field value.
    pub fn set(&mut self, field: BillField, value: Option<String>) {
        self.values[field.index()] = value;
    }

    /// True when the field has a non-empty value after trimming.
    pub fn is_present(&self, field: BillField) -> bool {
        self.get(field).is_some_and(|value| !value.trim().is_empty())
    }

    /// Number of present (non-empty) fields.
    pub fn present_count(&self) -> usize {
        BillField::ALL
            .iter()
            .filter(|&&field| self.is_present(field))
            .count()
    }

    /// Iterate fields in canonical order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (BillField, Option<&str>)> {
        BillField::ALL.iter().map(|&field| (field, self.get(field)))
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(BillField::ALL.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.as_str(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Unknown keys are dropped rather than rejected: model responses
        // sometimes carry extra keys alongside the requested ones.
        let map = serde_json::Map::deserialize(deserializer)?;
        let mut fields = FieldSet::new();
        for (key, value) in &map {
            if let Some(field) = BillField::from_name(key) {
                fields.set(field, scalar_to_string(value));
            }
        }
        Ok(fields)
    }
}

/// Coerce a JSON scalar to its string form.
///
/// Numbers keep their decimal rendering, null and empty strings become
/// absent, and non-scalar values are discarded.
pub(crate) fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn schema_has_twelve_fields_in_declared_order() {
        assert_eq!(BillField::ALL.len(), 12);
        assert_eq!(BillField::ALL[0], BillField::InvoiceNumber);
        assert_eq!(BillField::ALL[11], BillField::Discom);
        // Ord follows declaration order so ordered maps stay canonical.
        assert!(BillField::InvoiceNumber < BillField::Discom);
    }

    #[test]
    fn field_names_round_trip() {
        for field in BillField::ALL {
            assert_eq!(BillField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(BillField::from_name("total_amount"), None);
    }

    #[test]
    fn serializes_every_field_in_order() {
        let mut fields = FieldSet::new();
        fields.set(BillField::BillAmount, Some("1450.50".to_string()));

        let json = serde_json::to_string(&fields).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = parsed.as_object().unwrap();

        assert_eq!(object.len(), 12);
        assert_eq!(object["bill_amount"], "1450.50");
        assert_eq!(object["invoice_number"], serde_json::Value::Null);

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "invoice_number");
        assert_eq!(keys[11], "discom");
    }

    #[test]
    fn deserializes_numbers_and_ignores_null() {
        let json = r#"{"units_consumed": 450, "bill_amount": "1500", "discom": null}"#;
        let fields: FieldSet = serde_json::from_str(json).unwrap();

        assert_eq!(fields.get(BillField::UnitsConsumed), Some("450"));
        assert_eq!(fields.get(BillField::BillAmount), Some("1500"));
        assert_eq!(fields.get(BillField::Discom), None);
    }

    #[test]
    fn deserialization_skips_unknown_keys() {
        let json = r#"{"consumer_name": "Anita Desai", "confidence": 0.93, "notes": ["partial"]}"#;
        let fields: FieldSet = serde_json::from_str(json).unwrap();

        assert_eq!(fields.get(BillField::ConsumerName), Some("Anita Desai"));
        assert_eq!(fields.present_count(), 1);
    }

    #[test]
    fn empty_string_counts_as_absent() {
        let mut fields = FieldSet::new();
        fields.set(BillField::ConsumerName, Some("   ".to_string()));
        assert!(!fields.is_present(BillField::ConsumerName));

        fields.set(BillField::ConsumerName, Some("Rajesh Kumar".to_string()));
        assert!(fields.is_present(BillField::ConsumerName));
        assert_eq!(fields.present_count(), 1);
    }
}
