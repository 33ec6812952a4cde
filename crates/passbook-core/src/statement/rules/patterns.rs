//! Common regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dates inside a block
    pub static ref DATE_LONG: Regex = Regex::new(
        r"\b(\d{2}[/\-]\d{2}[/\-]\d{4})\b"
    ).unwrap();

    pub static ref DATE_SHORT: Regex = Regex::new(
        r"\b(\d{2}/\d{2}/\d{2})\b"
    ).unwrap();

    pub static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},\s*\d{4})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"(?i)\b(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{4})\b"
    ).unwrap();

    // Block starts
    pub static ref LINE_START_SHORT_DATE: Regex = Regex::new(
        r"^\d{2}/\d{2}/\d{2}\b"
    ).unwrap();

    pub static ref LINE_START_NUMERIC_DATE: Regex = Regex::new(
        r"^\d{2}[/\-]\d{2}[/\-](?:\d{4}|\d{2})\b"
    ).unwrap();

    /// `DD/MM/YYYY | HH:MM`, `DD/MM/YYYY]`, bare `DD/MM/YYYY` or `DD Mon YYYY`.
    pub static ref CARD_ROW_START: Regex = Regex::new(
        r"(?i)^(?:\d{2}[/\-]\d{2}[/\-]\d{4}|\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{4})(?:\s|\||\]|$)"
    ).unwrap();

    /// Date at the start of a split segment followed by a narration word.
    pub static ref SHORT_DATE_THEN_WORD: Regex = Regex::new(
        r"^\d{2}/\d{2}/\d{2}\s+[A-Z]"
    ).unwrap();

    // Times
    pub static ref TIME_AMPM: Regex = Regex::new(
        r"(?i)\b(\d{1,2}:\d{2}\s*[ap]m)\b"
    ).unwrap();

    pub static ref TIME_24H: Regex = Regex::new(
        r"\b(\d{2}:\d{2})\b"
    ).unwrap();

    // Amounts
    pub static ref DECIMAL_AMOUNT: Regex = Regex::new(
        r"\d[\d,]*\.\d{2}"
    ).unwrap();

    pub static ref WALLET_TYPE_AMOUNT: Regex = Regex::new(
        r"(?i)\b(DEBIT|CREDIT)\s+[₹$€]\s*(\d[\d,]*(?:\.\d+)?)"
    ).unwrap();

    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"[₹$€]\s*(\d[\d,]*(?:\.\d+)?)"
    ).unwrap();

    pub static ref CARD_AMOUNT_LINE: Regex = Regex::new(
        r"(?i)(?:\bUSD\s*\d[\d,]*(?:\.\d+)?|[₹$€]\s?\d[\d,]*(?:\.\d{2})?|\d[\d,]*\.\d{2})"
    ).unwrap();

    /// OCR output that lost the decimal point: `₹1,234 56`.
    pub static ref SPLIT_DECIMAL_AMOUNT: Regex = Regex::new(
        r"₹\s?(\d[\d,]*)\s(\d{2})\b"
    ).unwrap();

    pub static ref SIGNED_CARD_AMOUNT: Regex = Regex::new(
        r"(?i)(\d[\d,]*\.\d{2})\s*(Cr|Dr)\b"
    ).unwrap();

    // Instrument codes
    pub static ref ACH_CREDIT: Regex = Regex::new(
        r"(?i)\bACH\s?C-"
    ).unwrap();

    pub static ref ACH_DEBIT: Regex = Regex::new(
        r"(?i)\bACH\s?D-"
    ).unwrap();

    // Description pieces
    pub static ref REFERENCE_NUMBER: Regex = Regex::new(
        r"\b(0\d{9,}|\d{12,})\b"
    ).unwrap();

    pub static ref WALLET_COUNTERPARTY: Regex = Regex::new(
        r"(?i)\b(?:Paid to|Received from|Payment to)\s+(.+?)\s+(?:DEBIT|CREDIT)\b"
    ).unwrap();

    pub static ref LONG_ID: Regex = Regex::new(
        r"[A-Z0-9]{10,}"
    ).unwrap();

    pub static ref ID_SUFFIX: Regex = Regex::new(
        r"-[A-Z0-9-]+"
    ).unwrap();

    pub static ref CAPITALIZED_WORD: Regex = Regex::new(
        r"\b[A-Z][A-Za-z]+\b"
    ).unwrap();

    pub static ref LETTER_RUN: Regex = Regex::new(
        r"[A-Za-z]{3,}"
    ).unwrap();

    pub static ref TYPE_WORD: Regex = Regex::new(
        r"(?i)\b(?:DEBIT|CREDIT)\b"
    ).unwrap();

    pub static ref TABLE_SEPARATORS: Regex = Regex::new(
        r"[|\[\]]"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();

    // Footer noise
    pub static ref PAGE_COUNTER: Regex = Regex::new(
        r"^\d+\s+of\s+\d+$"
    ).unwrap();
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
