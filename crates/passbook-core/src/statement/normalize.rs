//! Date and amount normalization.
//!
//! Both functions are pure and idempotent: feeding a normalized value back in
//! yields the same value.

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use super::rules::patterns::collapse_whitespace;

lazy_static! {
    static ref ORDINAL_SUFFIX: Regex = Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap();
    static ref SEPT: Regex = Regex::new(r"(?i)\bsept\b").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap();
    static ref NUMERIC_DMY: Regex =
        Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})$").unwrap();
    static ref TRAILING_SHORT_YEAR: Regex = Regex::new(r"^(.*[\s/\-,])(\d{2})$").unwrap();
    static ref AMOUNT_JUNK: Regex = Regex::new(r"[^\d.\-]").unwrap();
}

/// Month-name layouts, tried in order after the numeric ones.
const NAMED_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%b %d,%Y",
    "%B %d, %Y",
    "%B %d,%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d/%b/%Y",
];

/// Expand a two-digit year: below 50 is 20xx, otherwise 19xx.
pub fn expand_year(year: i32) -> i32 {
    match year {
        0..=49 => 2000 + year,
        50..=99 => 1900 + year,
        _ => year,
    }
}

/// Parse a statement date string into a calendar date.
///
/// Returns `None` when no known layout matches; callers keep the original text.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace_all(text, "$1");
    let cleaned = SEPT.replace_all(&cleaned, "Sep");
    let cleaned = collapse_whitespace(&cleaned);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.captures(&cleaned) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = NUMERIC_DMY.captures(&cleaned) {
        let year: i32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 { expand_year(year) } else { year };
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if !cleaned.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let expanded = match TRAILING_SHORT_YEAR.captures(&cleaned) {
        Some(caps) => {
            let year: i32 = caps[2].parse().ok()?;
            format!("{}{}", &caps[1], expand_year(year))
        }
        None => cleaned,
    };

    NAMED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&expanded, fmt).ok())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Parse an amount string into a value with exactly two decimal places.
///
/// Everything except digits, `.` and `-` is discarded first, so currency
/// glyphs and thousands separators are tolerated.
pub fn normalize_amount(text: &str) -> Option<Decimal> {
    let cleaned = AMOUNT_JUNK.replace_all(text, "");
    if matches!(cleaned.as_ref(), "" | "-" | "." | "-.") {
        return None;
    }

    Decimal::from_str(&cleaned).ok().map(round_amount)
}

/// Round half away from zero to two places, with the scale fixed at 2.
pub fn round_amount(value: Decimal) -> Decimal {
    let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn dec(s: &str) -> Option<Decimal> {
        Decimal::from_str(s).ok()
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(normalize_date("01/02/2024"), date(2024, 2, 1));
        assert_eq!(normalize_date("01-02-2024"), date(2024, 2, 1));
        assert_eq!(normalize_date("01.02.2024"), date(2024, 2, 1));
        assert_eq!(normalize_date("01/02/24"), date(2024, 2, 1));
        assert_eq!(normalize_date("15.08.98"), date(1998, 8, 15));
        assert_eq!(normalize_date("2024-02-01"), date(2024, 2, 1));
    }

    #[test]
    fn test_named_dates() {
        assert_eq!(normalize_date("Oct 11, 2025"), date(2025, 10, 11));
        assert_eq!(normalize_date("October 11,2025"), date(2025, 10, 11));
        assert_eq!(normalize_date("Sept 3, 2025"), date(2025, 9, 3));
        assert_eq!(normalize_date("3rd  Sep 2025"), date(2025, 9, 3));
        assert_eq!(normalize_date("21-Mar-24"), date(2024, 3, 21));
        assert_eq!(normalize_date("21/Mar/2024"), date(2024, 3, 21));
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(expand_year(49), 2049);
        assert_eq!(expand_year(50), 1950);
        assert_eq!(expand_year(2024), 2024);
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("31/02/2024"), None);
        assert_eq!(normalize_date("Value Dt"), None);
        assert_eq!(normalize_date("Jan 05"), None);
    }

    #[test]
    fn test_date_is_idempotent() {
        for input in ["01/02/24", "Oct 11, 2025", "21-Mar-24"] {
            let first = normalize_date(input).unwrap();
            let again = normalize_date(&first.to_string()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_amounts() {
        assert_eq!(normalize_amount("₹1,400"), dec("1400.00"));
        assert_eq!(normalize_amount("9,750.00"), dec("9750.00"));
        assert_eq!(normalize_amount("-250.5"), dec("-250.50"));
        assert_eq!(normalize_amount("12.345"), dec("12.35"));
        assert_eq!(normalize_amount("$ 12"), dec("12.00"));
    }

    #[test]
    fn test_amount_scale_is_two() {
        let value = normalize_amount("250").unwrap();
        assert_eq!(value.to_string(), "250.00");
        assert_eq!(normalize_amount(&value.to_string()), Some(value));
    }

    #[test]
    fn test_rejected_amounts() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("N/A"), None);
        assert_eq!(normalize_amount("-"), None);
        assert_eq!(normalize_amount("₹."), None);
        assert_eq!(normalize_amount("1.2.3"), None);
    }
}
