//! Amount field text rules

use regex::Regex;
use std::sync::OnceLock;

static AMOUNT_TEXT: OnceLock<Regex> = OnceLock::new();

/// Optional digits, optional single decimal point, optional digits
fn amount_text() -> &'static Regex {
    AMOUNT_TEXT.get_or_init(|| {
        // ASCII digits only: `\d` would also admit other Unicode digits
        Regex::new(r"^[0-9]*\.?[0-9]*$").expect("Invalid amount text regex")
    })
}

/// Whether `raw` may be stored in the amount field
pub fn is_amount_text(raw: &str) -> bool {
    amount_text().is_match(raw)
}

/// Numeric value of an amount field, `None` for "" or "."
pub fn parse_amount(raw: &str) -> Option<f64> {
    if raw.is_empty() || raw == "." {
        return None;
    }
    raw.parse::<f64>().ok()
}

/// Whether the amount counts as zero for the submit button
///
/// Text without a numeric value (empty, a lone ".") counts as zero.
pub fn is_zero_amount(raw: &str) -> bool {
    parse_amount(raw).map_or(true, |v| v == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_text_accepts() {
        for ok in ["", "0", "12", "1.", ".5", "3.25", "."] {
            assert!(is_amount_text(ok), "should accept {:?}", ok);
        }
    }

    #[test]
    fn test_amount_text_rejects() {
        for bad in ["abc", "1.2.3", "-1", "1e5", " 1", "1,5", "١٢"] {
            assert!(!is_amount_text(bad), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3"), Some(3.0));
        assert_eq!(parse_amount("1."), Some(1.0));
        assert_eq!(parse_amount(".5"), Some(0.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("."), None);
    }

    #[test]
    fn test_is_zero_amount() {
        assert!(is_zero_amount("0"));
        assert!(is_zero_amount("0.000"));
        assert!(is_zero_amount(""));
        assert!(is_zero_amount("."));
        assert!(!is_zero_amount("0.01"));
    }
}
