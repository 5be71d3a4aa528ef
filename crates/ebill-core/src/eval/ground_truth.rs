//! Ground truth loading and filename matching.
//!
//! Ground truth files are hand-maintained JSON arrays with camelCase
//! keys and a nested `meterReadings` list, so they do not line up with
//! the extraction schema directly. This module owns the reshaping.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::Result;
use crate::models::{BillField, FieldSet, bill::scalar_to_string};

/// One expected-values entry, keyed by source file name.
///
/// Older entries use `expected_meter_number` and
/// `expected_unit_consumption` inside meter readings; both spellings are
/// accepted, with the newer key winning when an entry carries both.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroundTruthEntry {
    file_name: String,

    #[serde(rename = "invoiceNumber", deserialize_with = "string_or_number")]
    invoice_number: Option<String>,

    #[serde(rename = "previousReadingDate", deserialize_with = "string_or_number")]
    previous_reading_date: Option<String>,

    #[serde(rename = "presentReadingDate", deserialize_with = "string_or_number")]
    present_reading_date: Option<String>,

    #[serde(rename = "meterReadings")]
    meter_readings: Vec<MeterReading>,
}

/// One meter block inside a ground truth entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeterReading {
    #[serde(rename = "meterNumber", deserialize_with = "string_or_number")]
    meter_number: Option<String>,

    #[serde(rename = "expected_meter_number", deserialize_with = "string_or_number")]
    legacy_meter_number: Option<String>,

    #[serde(rename = "unitsConsumed", deserialize_with = "string_or_number")]
    units_consumed: Option<String>,

    #[serde(rename = "expected_unit_consumption", deserialize_with = "string_or_number")]
    legacy_units_consumed: Option<String>,
}

impl MeterReading {
    /// Meter number under either key spelling.
    pub fn meter_number(&self) -> Option<&str> {
        self.meter_number
            .as_deref()
            .or(self.legacy_meter_number.as_deref())
    }

    /// Units consumed under either key spelling.
    pub fn units_consumed(&self) -> Option<&str> {
        self.units_consumed
            .as_deref()
            .or(self.legacy_units_consumed.as_deref())
    }
}

impl GroundTruthEntry {
    /// Source file this entry describes (name with extension).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Flatten the entry into the extraction schema.
    ///
    /// Only the first meter reading is mapped; extra readings on
    /// multi-meter bills stay unevaluated. Sentinel values like `"NA"`
    /// pass through untouched, the evaluator decides what to skip.
    pub fn expected_fields(&self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.set(BillField::InvoiceNumber, self.invoice_number.clone());
        fields.set(
            BillField::PreviousReadingDate,
            self.previous_reading_date.clone(),
        );
        fields.set(
            BillField::CurrentReadingDate,
            self.present_reading_date.clone(),
        );
        if let Some(meter) = self.meter_readings.first() {
            fields.set(
                BillField::MeterNumber,
                meter.meter_number().map(str::to_string),
            );
            fields.set(
                BillField::UnitsConsumed,
                meter.units_consumed().map(str::to_string),
            );
        }
        fields
    }
}

/// Accept strings and numbers alike; units are sometimes bare integers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// Load a ground truth file (a JSON array of entries).
pub fn load_ground_truth(path: &Path) -> Result<Vec<GroundTruthEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Find the entry for a document by file name, ignoring case.
///
/// `filename` may be a bare name or a full path; only the final
/// component is compared.
pub fn find_entry<'a>(
    entries: &'a [GroundTruthEntry],
    filename: &str,
) -> Option<&'a GroundTruthEntry> {
    let base = Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| filename.to_lowercase());
    entries
        .iter()
        .find(|entry| entry.file_name.to_lowercase() == base)
}
