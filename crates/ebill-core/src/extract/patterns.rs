//! Regex pattern tables for Indian electricity bill fields.
//!
//! Each field has an ordered list of patterns; extraction tries them in
//! order and takes the first capture. Labels vary a lot between DISCOMs
//! (distribution companies), so most fields carry several spellings.

use lazy_static::lazy_static;
use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

lazy_static! {
    // Invoice/bill/receipt number (alphanumeric, 8-20 chars)
    pub static ref INVOICE_NUMBER: Vec<Regex> = compile(&[
        r"(?i)Invoice\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{8,20})",
        r"(?i)Bill\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{8,20})",
        r"(?i)Receipt\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{8,20})",
    ]);

    // Consumer name, after a "Name" or "Bill To" label
    pub static ref CONSUMER_NAME: Vec<Regex> = compile(&[
        r"(?i)(?:Consumer\s*)?Name\s*[:\-]?\s*([A-Z][A-Za-z\s\.]{2,50})",
        r"(?i)Bill\s*To\s*[:\-]?\s*([A-Z][A-Za-z\s\.]{2,50})",
    ]);

    // Consumer/account number (10-15 chars)
    pub static ref CONSUMER_NUMBER: Vec<Regex> = compile(&[
        r"(?i)Consumer\s*(?:No|Number|ID)\s*[:\-]?\s*([A-Z0-9]{10,15})",
        r"(?i)Account\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{10,15})",
        r"(?i)CA\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{10,15})",
    ]);

    // Meter number (8-12 chars)
    pub static ref METER_NUMBER: Vec<Regex> = compile(&[
        r"(?i)Meter\s*(?:No|Number)\s*[:\-]?\s*([A-Z0-9]{8,12})",
        r"(?i)Meter\s*ID\s*[:\-]?\s*([A-Z0-9]{8,12})",
    ]);

    // Billing period as a date range
    pub static ref BILLING_PERIOD: Vec<Regex> = compile(&[
        r"(?i)Billing\s*Period\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\s*(?:to|TO|-)\s*\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)Bill\s*Period\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\s*(?:to|TO|-)\s*\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ]);

    // Previous meter reading date
    pub static ref PREVIOUS_READING_DATE: Vec<Regex> = compile(&[
        r"(?i)Previous\s*(?:Reading\s*)?Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)Last\s*Reading\s*Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ]);

    // Current meter reading date
    pub static ref CURRENT_READING_DATE: Vec<Regex> = compile(&[
        r"(?i)Current\s*(?:Reading\s*)?Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)Present\s*Reading\s*Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ]);

    // Units consumed (kWh)
    pub static ref UNITS_CONSUMED: Vec<Regex> = compile(&[
        r"(?i)(?:Units\s*)?Consumed\s*[:\-]?\s*(\d+(?:\.\d+)?)\s*(?:kWh|Units)?",
        r"(?i)Total\s*Units\s*[:\-]?\s*(\d+(?:\.\d+)?)",
        r"(?i)Consumption\s*[:\-]?\s*(\d+(?:\.\d+)?)\s*(?:kWh|Units)?",
    ]);

    // Bill amount, with or without a currency marker
    pub static ref BILL_AMOUNT: Vec<Regex> = compile(&[
        r"(?i)(?:Total\s*)?(?:Bill\s*)?Amount\s*(?:Payable)?\s*[:\-]?\s*(?:Rs\.?|₹)\s*(\d+(?:,\d+)*(?:\.\d{2})?)",
        r"(?i)(?:Total\s*)?(?:Bill\s*)?Amount\s*(?:Payable)?\s*[:\-]?\s*(\d+(?:,\d+)*(?:\.\d{2})?)",
        r"(?i)Amount\s*Due\s*[:\-]?\s*(?:Rs\.?|₹)\s*(\d+(?:,\d+)*(?:\.\d{2})?)",
    ]);

    // Payment due date
    pub static ref DUE_DATE: Vec<Regex> = compile(&[
        r"(?i)Due\s*Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)Pay\s*(?:by|Before)\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)Payment\s*Due\s*Date\s*[:\-]?\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ]);

    // Consumer address (free-form, capped length)
    pub static ref ADDRESS: Vec<Regex> = compile(&[
        r"(?i)(?:Consumer\s*)?Address\s*[:\-]?\s*([A-Za-z0-9\s,\.\-/]{10,150})",
        r"(?i)Service\s*Address\s*[:\-]?\s*([A-Za-z0-9\s,\.\-/]{10,150})",
    ]);
}

/// Distribution companies recognized by substring search.
///
/// The canonical spelling here is what gets reported, whatever the case
/// in the bill text.
pub const DISCOMS: [&str; 11] = [
    "MSEDCL",
    "TATA Power",
    "Adani Electricity",
    "BSES",
    "BESCOM",
    "KSEB",
    "TANGEDCO",
    "PSPCL",
    "UPPCL",
    "Reliance Energy",
    "Torrent Power",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        // Force every lazy table; a bad pattern would panic here.
        assert_eq!(INVOICE_NUMBER.len(), 3);
        assert_eq!(CONSUMER_NAME.len(), 2);
        assert_eq!(CONSUMER_NUMBER.len(), 3);
        assert_eq!(METER_NUMBER.len(), 2);
        assert_eq!(BILLING_PERIOD.len(), 2);
        assert_eq!(PREVIOUS_READING_DATE.len(), 2);
        assert_eq!(CURRENT_READING_DATE.len(), 2);
        assert_eq!(UNITS_CONSUMED.len(), 3);
        assert_eq!(BILL_AMOUNT.len(), 3);
        assert_eq!(DUE_DATE.len(), 3);
        assert_eq!(ADDRESS.len(), 2);
    }

    #[test]
    fn test_invoice_number_label_variants() {
        for text in [
            "Invoice No: INV2024080001",
            "BILL NUMBER - MH2024123456",
            "Receipt No: RCP20240815XY",
        ] {
            let hit = INVOICE_NUMBER.iter().any(|p| p.is_match(text));
            assert!(hit, "no pattern matched {text:?}");
        }
    }

    #[test]
    fn test_date_patterns_accept_both_separators() {
        assert!(DUE_DATE[0].is_match("Due Date: 15/08/2024"));
        assert!(DUE_DATE[0].is_match("Due Date: 15-08-2024"));
        assert!(!DUE_DATE[0].is_match("Due Date: August 15"));
    }
}
