//! Date and time extraction.

use regex::Regex;

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_LONG, DATE_MONTH_NAME, DATE_SHORT, TIME_24H, TIME_AMPM};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
///
/// Layers in precedence order: `DD/MM/YYYY` or `DD-MM-YYYY`, `DD/MM/YY`,
/// `Mon DD, YYYY`, then `DD Mon YYYY`. Produces the date text as written;
/// parsing is left to the normalizer.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn layers() -> [&'static Regex; 4] {
        [&DATE_LONG, &DATE_SHORT, &DATE_MONTH_NAME, &DATE_DAY_MONTH_YEAR]
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        Self::layers().into_iter().find_map(|re| first_capture(re, text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();
        for re in Self::layers() {
            for m in re.captures_iter(text).filter_map(|caps| caps.get(1)) {
                let overlaps = results
                    .iter()
                    .any(|r| m.start() < r.end() && r.start() < m.end());
                if !overlaps {
                    results.push(ExtractionMatch::new(m.as_str().to_string(), m.as_str(), m.start(), m.end()));
                }
            }
        }
        results.sort_by_key(|r| r.start());
        results
    }
}

/// Time field extractor. `H:MM am/pm` wins over a bare `HH:MM`.
pub struct TimeExtractor;

impl TimeExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TimeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TimeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_capture(&TIME_AMPM, text).or_else(|| first_capture(&TIME_24H, text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = TIME_AMPM
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| ExtractionMatch::new(m.as_str().to_string(), m.as_str(), m.start(), m.end()))
            .collect();
        for m in TIME_24H.captures_iter(text).filter_map(|caps| caps.get(1)) {
            if !results.iter().any(|r| m.start() >= r.start() && m.start() < r.end()) {
                results.push(ExtractionMatch::new(m.as_str().to_string(), m.as_str(), m.start(), m.end()));
            }
        }
        results.sort_by_key(|r| r.start());
        results
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<ExtractionMatch<String>> {
    let m = re.captures(text)?.get(1)?;
    Some(ExtractionMatch::new(m.as_str().to_string(), m.as_str(), m.start(), m.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_long_date_wins_over_short() {
        let extractor = DateExtractor::new();
        let result = extractor.extract("REF 01/02/24 posted 03-02-2024").unwrap();
        assert_eq!(result.value, "03-02-2024");
    }

    #[test]
    fn test_short_and_month_name_dates() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("01/02/24 STARBUCKS").unwrap().value, "01/02/24");
        assert_eq!(
            extractor.extract("Oct 11, 2025 Paid to DEEP GARMENTS").unwrap().value,
            "Oct 11, 2025"
        );
        assert!(extractor.extract("no dates here").is_none());
    }

    #[test]
    fn test_extract_all_in_text_order() {
        let extractor = DateExtractor::new();
        let all = extractor.extract_all("01/02/24 STARBUCKS REF001 02/02/24 250.00");
        let values: Vec<_> = all.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["01/02/24", "02/02/24"]);
        assert_eq!(all[1].position, (26, 34));
    }

    #[test]
    fn test_time_prefers_meridiem() {
        let extractor = TimeExtractor::new();
        assert_eq!(extractor.extract("Oct 11 | 05:49 pm | 17:49").unwrap().value, "05:49 pm");
        assert_eq!(extractor.extract("15/03/2024 | 14:22").unwrap().value, "14:22");
        assert!(extractor.extract("01/02/24 STARBUCKS").is_none());
    }
}
