//! OCR text cleanup.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(r" +").unwrap();
}

/// Tidy raw OCR output without destroying line structure.
///
/// Runs of blank lines are capped at two, runs of spaces collapse to
/// one, and the whole text is trimmed. Line breaks survive because the
/// field patterns rely on label-and-value layout.
pub fn clean_ocr_text(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                kept.push(line);
            }
        } else {
            kept.push(line);
            blank_run = 0;
        }
    }

    let joined = kept.join("\n");
    SPACE_RUNS.replace_all(&joined, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collapses_space_runs_but_keeps_newlines() {
        let cleaned = clean_ocr_text("Consumer No:    1234567890\nDue   Date: 15/08/2024");
        assert_eq!(cleaned, "Consumer No: 1234567890\nDue Date: 15/08/2024");
    }

    #[test]
    fn test_caps_blank_line_runs_at_two() {
        let cleaned = clean_ocr_text("top\n\n\n\n\nbottom");
        assert_eq!(cleaned, "top\n\n\nbottom");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(clean_ocr_text("\n\n  MSEDCL  \n\n"), "MSEDCL");
        assert_eq!(clean_ocr_text(""), "");
    }
}
