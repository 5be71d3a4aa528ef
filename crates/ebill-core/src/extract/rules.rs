//! Pattern-based field extraction.

use regex::Regex;
use tracing::debug;

use crate::models::{BillField, FieldSet};

use super::patterns;

/// Deterministic pattern-based extractor.
///
/// Tries each field's pattern table in order and keeps the first capture.
/// Nothing is guessed: a field with no matching label stays absent.
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run every field's pattern table against the text.
    pub fn extract(&self, text: &str) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.set(
            BillField::InvoiceNumber,
            find_first(text, &patterns::INVOICE_NUMBER),
        );
        fields.set(
            BillField::ConsumerName,
            find_first(text, &patterns::CONSUMER_NAME),
        );
        fields.set(
            BillField::ConsumerNumber,
            find_first(text, &patterns::CONSUMER_NUMBER),
        );
        fields.set(
            BillField::MeterNumber,
            find_first(text, &patterns::METER_NUMBER),
        );
        fields.set(
            BillField::BillingPeriod,
            find_first(text, &patterns::BILLING_PERIOD),
        );
        fields.set(
            BillField::PreviousReadingDate,
            find_first(text, &patterns::PREVIOUS_READING_DATE),
        );
        fields.set(
            BillField::CurrentReadingDate,
            find_first(text, &patterns::CURRENT_READING_DATE),
        );
        fields.set(
            BillField::UnitsConsumed,
            find_first(text, &patterns::UNITS_CONSUMED),
        );
        fields.set(
            BillField::BillAmount,
            find_first(text, &patterns::BILL_AMOUNT).map(strip_commas),
        );
        fields.set(BillField::DueDate, find_first(text, &patterns::DUE_DATE));
        fields.set(BillField::Address, find_first(text, &patterns::ADDRESS));
        fields.set(BillField::Discom, find_discom(text));

        debug!(present = fields.present_count(), "pattern extraction done");
        fields
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// First capture group of the first pattern that matches.
fn find_first(text: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            if let Some(group) = caps.get(1) {
                let value = group.as_str().trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Amounts are grouped with commas on bills; strip them so downstream
/// comparison sees a plain number.
fn strip_commas(value: String) -> String {
    value.replace(',', "")
}

/// Case-insensitive search for a known distribution company.
///
/// Returns the canonical spelling from the table, not the text's casing.
fn find_discom(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    patterns::DISCOMS
        .iter()
        .find(|discom| upper.contains(&discom.to_uppercase()))
        .map(|discom| discom.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_BILL: &str = "\
MSEDCL Electricity Bill
Invoice No: INV2024080001
Consumer No: 1234567890
Meter Number: MTR98765432
Billing Period: 01/07/2024 to 31/07/2024
Previous Reading Date: 01/07/2024
Current Reading Date: 31/07/2024
Units Consumed: 450 kWh
Total Amount Payable: Rs. 5,600.00
Due Date: 15/08/2024
";

    #[test]
    fn test_extract_sample_bill() {
        let fields = PatternExtractor::new().extract(SAMPLE_BILL);

        assert_eq!(fields.get(BillField::InvoiceNumber), Some("INV2024080001"));
        assert_eq!(fields.get(BillField::ConsumerNumber), Some("1234567890"));
        assert_eq!(fields.get(BillField::MeterNumber), Some("MTR98765432"));
        assert_eq!(
            fields.get(BillField::BillingPeriod),
            Some("01/07/2024 to 31/07/2024")
        );
        assert_eq!(
            fields.get(BillField::PreviousReadingDate),
            Some("01/07/2024")
        );
        assert_eq!(fields.get(BillField::CurrentReadingDate), Some("31/07/2024"));
        assert_eq!(fields.get(BillField::UnitsConsumed), Some("450"));
        assert_eq!(fields.get(BillField::BillAmount), Some("5600.00"));
        assert_eq!(fields.get(BillField::DueDate), Some("15/08/2024"));
        assert_eq!(fields.get(BillField::Discom), Some("MSEDCL"));

        // No name or address label in this bill.
        assert_eq!(fields.get(BillField::ConsumerName), None);
        assert_eq!(fields.get(BillField::Address), None);
        assert_eq!(fields.present_count(), 10);
    }

    #[test]
    fn test_extract_empty_text() {
        let fields = PatternExtractor::new().extract("");
        assert_eq!(fields.present_count(), 0);
    }

    #[test]
    fn test_amount_falls_through_pattern_list() {
        // No "Amount <currency>" form, so the "Amount Due" pattern wins.
        let fields = PatternExtractor::new().extract("Amount Due: Rs 1,450.50");
        assert_eq!(fields.get(BillField::BillAmount), Some("1450.50"));
    }

    #[test]
    fn test_amount_without_currency_marker() {
        let fields = PatternExtractor::new().extract("Amount: 920");
        assert_eq!(fields.get(BillField::BillAmount), Some("920"));
    }

    #[test]
    fn test_amount_with_rupee_sign() {
        let fields = PatternExtractor::new().extract("Amount Payable: ₹ 784");
        assert_eq!(fields.get(BillField::BillAmount), Some("784"));
    }

    #[test]
    fn test_alternate_reading_date_labels() {
        let fields = PatternExtractor::new()
            .extract("Last Reading Date: 05-06-2024\nPresent Reading Date: 05-07-2024");
        assert_eq!(fields.get(BillField::PreviousReadingDate), Some("05-06-2024"));
        assert_eq!(fields.get(BillField::CurrentReadingDate), Some("05-07-2024"));
    }

    #[test]
    fn test_consumer_name_from_bill_to() {
        let fields = PatternExtractor::new().extract("Bill To: Anita Desai");
        assert_eq!(fields.get(BillField::ConsumerName), Some("Anita Desai"));
    }

    #[test]
    fn test_discom_is_reported_with_canonical_spelling() {
        let fields = PatternExtractor::new().extract("supplied by tata power mumbai");
        assert_eq!(fields.get(BillField::Discom), Some("TATA Power"));
    }
}
