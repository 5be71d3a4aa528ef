//! Prompt construction for model-based extraction.
//!
//! The field directory and the JSON template are generated from
//! [`BillField::ALL`], so the prompt can never drift from the schema the
//! response parser expects.

use crate::models::BillField;

/// System message pinning the model to verbatim extraction.
pub(crate) const SYSTEM_MESSAGE: &str = "You are a precise data extraction assistant. \
     Extract only what is explicitly present in the text. Return valid JSON only.";

/// Worked example appended when `prompt_examples` is on. Indian bills are
/// frequently bilingual, so the example shows Hindi/English labels.
const WORKED_EXAMPLE: &str = r#"Example:

Text:
बिल संख्या / Bill No: MH08154321001
उपभोक्ता का नाम / Consumer Name: SUNITA RAO
Units Consumed: 312 kWh
देय तिथि / Due Date: 20/09/2024

Output:
{
  "invoice_number": "MH08154321001",
  "consumer_name": "SUNITA RAO",
  "consumer_number": null,
  "meter_number": null,
  "billing_period": null,
  "previous_reading_date": null,
  "current_reading_date": null,
  "units_consumed": "312",
  "bill_amount": null,
  "due_date": null,
  "address": null,
  "discom": null
}
"#;

/// Build the user prompt for a piece of OCR text.
pub fn user_prompt(ocr_text: &str, with_example: bool) -> String {
    let mut prompt = String::from(
        "You are given OCR text from an Indian electricity bill.\n\
         \n\
         Extract the following fields exactly as they appear in the text.\n\
         If a field is missing or unclear, return null.\n\
         Do not guess or infer values.\n\
         Return ONLY valid JSON matching the schema below.\n\
         \n\
         Required fields:\n",
    );
    for field in BillField::ALL {
        prompt.push_str("- ");
        prompt.push_str(field.as_str());
        prompt.push_str(": ");
        prompt.push_str(field.description());
        prompt.push('\n');
    }
    if with_example {
        prompt.push('\n');
        prompt.push_str(WORKED_EXAMPLE);
    }
    prompt.push_str("\nOCR Text:\n");
    prompt.push_str(ocr_text);
    prompt.push_str("\n\nReturn JSON in this exact format:\n");
    prompt.push_str(&schema_template());
    prompt.push('\n');
    prompt
}

/// JSON object with every field null, listed in canonical order.
fn schema_template() -> String {
    let mut out = String::from("{\n");
    for (i, field) in BillField::ALL.iter().enumerate() {
        out.push_str("  \"");
        out.push_str(field.as_str());
        out.push_str("\": null");
        if i + 1 < BillField::ALL.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_field() {
        let prompt = user_prompt("Consumer No: 1234567890", false);
        for field in BillField::ALL {
            assert!(
                prompt.contains(field.as_str()),
                "prompt is missing {}",
                field.as_str()
            );
        }
        assert!(prompt.contains("Consumer No: 1234567890"));
    }

    #[test]
    fn test_prompt_ends_with_null_template() {
        let prompt = user_prompt("some text", false);
        assert!(prompt.contains("Return JSON in this exact format:"));
        assert!(prompt.trim_end().ends_with('}'));
        assert!(prompt.contains("\"invoice_number\": null,"));
        assert!(prompt.contains("\"discom\": null"));
    }

    #[test]
    fn test_example_block_is_opt_in() {
        let plain = user_prompt("text", false);
        let with_example = user_prompt("text", true);
        assert!(!plain.contains("Example:"));
        assert!(with_example.contains("Example:"));
        assert!(with_example.contains("SUNITA RAO"));
    }

    #[test]
    fn test_template_is_valid_json() {
        let template = schema_template();
        let parsed: serde_json::Value = serde_json::from_str(&template).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 12);
    }
}
