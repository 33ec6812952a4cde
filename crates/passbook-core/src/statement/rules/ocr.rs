//! Repairs for currency glyphs mangled by OCR.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TYPE_TWO_SPACED: Regex =
        Regex::new(r"(?i)\b(DEBIT|CREDIT|Paid|Received)\s+2\s+(\d[\d,]*(?:\.\d+)?)").unwrap();
    static ref TYPE_TWO_GLUED: Regex =
        Regex::new(r"(?i)\b(DEBIT|CREDIT|Paid|Received|Amount|Amt)\s+2(\d[\d,]*\.\d{2})\b").unwrap();
    static ref RUPEE_ABBREVIATION: Regex = Regex::new(r"\bRs?\.?\s*(\d[\d,]*(?:\.\d+)?)").unwrap();
    static ref INR_PREFIX: Regex = Regex::new(r"\bINR\s+(\d[\d,]*(?:\.\d+)?)").unwrap();
}

/// Put `₹` back where OCR read it as `2`, `R`, `Rs`, `Rs.` or `INR`.
///
/// Only rewrites figures that follow a transaction keyword or a rupee
/// abbreviation, so plain numbers in narrations are left alone.
pub fn repair_currency_glyphs(text: &str) -> String {
    let text = TYPE_TWO_SPACED.replace_all(text, "$1 ₹$2");
    let text = TYPE_TWO_GLUED.replace_all(&text, "$1 ₹$2");
    let text = RUPEE_ABBREVIATION.replace_all(&text, "₹$1");
    INR_PREFIX.replace_all(&text, "₹$1").into_owned()
}
