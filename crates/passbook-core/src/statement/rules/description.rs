//! Description extraction: structural markers first, then entity spans, then
//! whatever is left after stripping dates, times and figures.

use super::dates::{DateExtractor, TimeExtractor};
use super::patterns::{
    collapse_whitespace, CAPITALIZED_WORD, CURRENCY_AMOUNT, DECIMAL_AMOUNT, ID_SUFFIX, LETTER_RUN,
    LONG_ID, REFERENCE_NUMBER, TABLE_SEPARATORS, TYPE_WORD, WALLET_COUNTERPARTY,
};
use super::FieldExtractor;
use crate::document::{EntityLabel, EntitySpan};

/// Counterparty named between a wallet `Paid to` marker and the type keyword.
pub fn wallet_counterparty(segment: &str) -> Option<String> {
    let caps = WALLET_COUNTERPARTY.captures(segment)?;
    non_empty(collapse_whitespace(&caps[1]))
}

/// Narration between the transaction date and the reference number.
///
/// The reference is only looked for before `fallback_end` (the value date
/// in a column layout); without one the narration runs up to it.
pub fn narration_before_reference(text: &str, date_end: usize, fallback_end: usize) -> Option<String> {
    let rest = text.get(date_end..)?;
    let window = fallback_end.saturating_sub(date_end);
    let end = REFERENCE_NUMBER
        .find(rest.get(..window).unwrap_or(rest))
        .map_or(window, |m| m.start());
    non_empty(collapse_whitespace(rest.get(..end)?))
}

/// Extra detail printed after the balance column (city, payee name).
///
/// Long identifiers are dropped; the first two capitalised words are kept.
pub fn trailing_details(trailing: &str) -> Option<String> {
    if !LETTER_RUN.is_match(trailing) {
        return None;
    }
    let without_ids = LONG_ID.replace_all(trailing, "");
    let without_ids = ID_SUFFIX.replace_all(&without_ids, "");
    let cleaned = collapse_whitespace(&without_ids);
    if cleaned.chars().count() <= 3 {
        return None;
    }

    let names: Vec<&str> = CAPITALIZED_WORD
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .take(2)
        .collect();
    non_empty(names.join(" "))
}

/// Organisation spans, then miscellaneous spans, that occur in the block.
pub fn entity_description(block: &str, entities: &[EntitySpan]) -> Option<String> {
    let mut picked: Vec<&str> = Vec::new();
    for label in [EntityLabel::Org, EntityLabel::Misc] {
        for span in entities.iter().filter(|e| e.label == label) {
            let text = span.text.trim();
            if !text.is_empty() && block.contains(text) && !picked.contains(&text) {
                picked.push(text);
            }
        }
    }
    non_empty(picked.join(" "))
}

/// Block text with dates, times, figures, type keywords and separators removed.
pub fn stripped_description(block: &str) -> Option<String> {
    let mut text = block.to_string();
    for m in DateExtractor::new().extract_all(block).iter().rev() {
        text.replace_range(m.start()..m.end(), " ");
    }
    for m in TimeExtractor::new().extract_all(&text).iter().rev() {
        text.replace_range(m.start()..m.end(), " ");
    }
    let text = CURRENCY_AMOUNT.replace_all(&text, " ");
    let text = DECIMAL_AMOUNT.replace_all(&text, " ");
    let text = TYPE_WORD.replace_all(&text, " ");
    let text = TABLE_SEPARATORS.replace_all(&text, " ");

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.'))
        .collect();
    non_empty(words.join(" "))
}

/// Final cleanup applied to every description.
pub fn clean_description(text: &str) -> String {
    collapse_whitespace(&TABLE_SEPARATORS.replace_all(text, " "))
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
