//! Format-aware line segmentation: page text into candidate transaction blocks.

use tracing::{debug, trace};

use super::classifier::StatementFormat;
use super::rules::patterns::{
    CARD_AMOUNT_LINE, CARD_ROW_START, CURRENCY_AMOUNT, DATE_MONTH_NAME, DATE_SHORT, DECIMAL_AMOUNT,
    LINE_START_NUMERIC_DATE, LINE_START_SHORT_DATE, PAGE_COUNTER, SHORT_DATE_THEN_WORD, TIME_24H,
};
use crate::document::DocumentPage;
use crate::models::config::ExtractionConfig;

const SUMMARY_MARKERS: &[&str] = &[
    "STATEMENTSUMMARY",
    "STATEMENT SUMMARY",
    "OPENINGBALANCE",
    "OPENING BALANCE",
    "CLOSINGBALANCE",
    "CLOSING BALANCE",
];

const COUNT_MARKERS: &[&str] = &["DRCOUNT", "DR COUNT", "CRCOUNT", "CR COUNT"];

const FOOTER_MARKERS: &[&str] = &["Page No", "Generated On", "Generated By"];

const CARD_HEADER_WORDS: &[&str] = &[
    "DATE",
    "TIME",
    "TRANSACTION",
    "DESCRIPTION",
    "AMOUNT",
    "DOMESTIC",
    "INTERNATIONAL",
];

const WALLET_HEADER_WORDS: &[&str] = &[
    "DATE",
    "TIME",
    "TRANSACTION",
    "DESCRIPTION",
    "AMOUNT",
    "STATEMENT",
    "PAGE",
];

/// One candidate transaction, possibly spanning several physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Assembled block text.
    pub text: String,
    /// The physical lines (or line segments) the block was built from.
    pub lines: Vec<String>,
    /// Page the block came from.
    pub page: u32,
    /// First and last source line, 1-based and inclusive.
    pub first_line: usize,
    pub last_line: usize,
}

/// True when text belongs to a statement summary rather than a transaction.
pub fn is_summary_text(text: &str) -> bool {
    let upper = text.to_uppercase();
    SUMMARY_MARKERS.iter().any(|m| upper.contains(m))
        || (COUNT_MARKERS.iter().any(|m| upper.contains(m))
            && (upper.contains("DEBITS") || upper.contains("CREDITS")))
}

fn is_footer_noise(line: &str) -> bool {
    line.starts_with("--")
        || FOOTER_MARKERS.iter().any(|m| line.contains(m))
        || PAGE_COUNTER.is_match(line)
}

fn is_card_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    !line.chars().any(|c| c.is_ascii_digit()) && CARD_HEADER_WORDS.iter().any(|w| upper.contains(w))
}

/// Title and column-header lines, e.g. `Transaction Statement for Oct 01, 2025 - Oct 31, 2025`.
fn is_wallet_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    !CURRENCY_AMOUNT.is_match(line)
        && upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| WALLET_HEADER_WORDS.contains(&word))
}

/// Splits page text into raw blocks for one statement format.
pub struct LineSegmenter {
    format: StatementFormat,
    wallet_lookahead: usize,
    continuation_lines: usize,
    card_lookahead: usize,
}

impl LineSegmenter {
    /// Create a segmenter with default look-ahead limits.
    pub fn new(format: StatementFormat) -> Self {
        Self::with_config(format, &ExtractionConfig::default())
    }

    /// Create a segmenter with the look-ahead limits from `config`.
    pub fn with_config(format: StatementFormat, config: &ExtractionConfig) -> Self {
        Self {
            format,
            wallet_lookahead: config.wallet_lookahead,
            continuation_lines: config.continuation_lines,
            card_lookahead: config.card_lookahead,
        }
    }

    /// Segment one page into blocks, in line order. Summary blocks are dropped.
    pub fn segment(&self, page: &DocumentPage) -> Vec<RawBlock> {
        let lines: Vec<&str> = page.text.lines().map(str::trim).collect();
        let blocks = match self.format {
            StatementFormat::WalletTransfer => self.segment_wallet(&lines, page.number),
            StatementFormat::BankAccountStatement => self.segment_bank(&lines, page.number),
            StatementFormat::CreditCardStatement => self.segment_card(&lines, page.number),
            StatementFormat::GenericBankStatement | StatementFormat::Unknown => {
                self.segment_generic(&lines, page.number)
            }
        };

        let kept: Vec<RawBlock> = blocks
            .into_iter()
            .filter(|block| {
                let summary = is_summary_text(&block.text);
                if summary {
                    trace!("Dropping summary block: {}", block.text);
                }
                !summary
            })
            .collect();

        debug!(
            "Page {}: {} lines -> {} {} blocks",
            page.number,
            lines.len(),
            kept.len(),
            self.format
        );
        kept
    }

    fn segment_wallet(&self, lines: &[&str], page: u32) -> Vec<RawBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].is_empty() || is_wallet_header(lines[i]) || !DATE_MONTH_NAME.is_match(lines[i]) {
                i += 1;
                continue;
            }

            let mut parts = vec![lines[i].to_string()];
            let mut j = i + 1;
            while j < lines.len() && j <= i + self.wallet_lookahead {
                let next = lines[j];
                if next.is_empty() || DATE_MONTH_NAME.is_match(next) {
                    break;
                }
                parts.push(next.to_string());
                j += 1;
            }

            blocks.push(RawBlock {
                text: parts.join(" | "),
                lines: parts,
                page,
                first_line: i + 1,
                last_line: j,
            });
            i = j;
        }

        blocks
    }

    fn segment_bank(&self, lines: &[&str], page: u32) -> Vec<RawBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if !LINE_START_SHORT_DATE.is_match(lines[i]) {
                i += 1;
                continue;
            }

            let mut segments = split_transactions(lines[i]);
            let (continuation, next) = self.continuation(lines, i);
            if let Some(last) = segments.last_mut() {
                for extra in &continuation {
                    last.push(' ');
                    last.push_str(extra);
                }
            }

            let single = segments.len() == 1;
            for segment in segments {
                let block_lines = if single {
                    std::iter::once(lines[i].to_string())
                        .chain(continuation.iter().map(|s| s.to_string()))
                        .collect()
                } else {
                    vec![segment.clone()]
                };
                blocks.push(RawBlock {
                    text: segment,
                    lines: block_lines,
                    page,
                    first_line: i + 1,
                    last_line: next,
                });
            }
            i = next;
        }

        blocks
    }

    fn segment_card(&self, lines: &[&str], page: u32) -> Vec<RawBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(start) = CARD_ROW_START.find(lines[i]) else {
                i += 1;
                continue;
            };

            let mut parts = vec![lines[i].to_string()];
            let mut j = i + 1;

            let rest = TIME_24H.replace(&lines[i][start.end()..], "");
            let amount_on_date_line = CARD_AMOUNT_LINE.is_match(&rest);

            while !amount_on_date_line && j < lines.len() && j <= i + self.card_lookahead {
                let next = lines[j];
                if next.is_empty() || is_card_header(next) {
                    j += 1;
                    continue;
                }
                if CARD_ROW_START.is_match(next) {
                    break;
                }
                parts.push(next.to_string());
                j += 1;
                if CARD_AMOUNT_LINE.is_match(next) {
                    break;
                }
            }

            blocks.push(RawBlock {
                text: parts.join(" | "),
                lines: parts,
                page,
                first_line: i + 1,
                last_line: j,
            });
            i = j;
        }

        blocks
    }

    fn segment_generic(&self, lines: &[&str], page: u32) -> Vec<RawBlock> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if !LINE_START_NUMERIC_DATE.is_match(lines[i]) {
                i += 1;
                continue;
            }

            let (continuation, next) = self.continuation(lines, i);
            let mut parts = vec![lines[i].to_string()];
            parts.extend(continuation.iter().map(|s| s.to_string()));

            blocks.push(RawBlock {
                text: parts.join(" "),
                lines: parts,
                page,
                first_line: i + 1,
                last_line: next,
            });
            i = next;
        }

        blocks
    }

    /// Continuation lines after `start`. Returns the absorbed lines and the
    /// index of the first line not consumed.
    fn continuation<'a>(&self, lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
        let mut absorbed = Vec::new();
        let mut j = start + 1;

        while j < lines.len() && absorbed.len() < self.continuation_lines {
            let next = lines[j];
            if next.is_empty() || LINE_START_NUMERIC_DATE.is_match(next) || is_summary_text(next) {
                break;
            }
            if !is_footer_noise(next) {
                absorbed.push(next);
            }
            j += 1;
        }

        (absorbed, j)
    }
}

/// Split a physical line that holds several bank transactions.
///
/// A later short date starts a new transaction only when the text since the
/// current start already holds a decimal amount and the date is followed by a
/// narration word. Split pieces without an amount are discarded.
pub fn split_transactions(line: &str) -> Vec<String> {
    let mut starts = vec![0];
    for m in DATE_SHORT.find_iter(line).skip(1) {
        let current = starts[starts.len() - 1];
        let since_start = &line[current..m.start()];
        if DECIMAL_AMOUNT.is_match(since_start) && SHORT_DATE_THEN_WORD.is_match(&line[m.start()..]) {
            starts.push(m.start());
        }
    }

    if starts.len() == 1 {
        return vec![line.to_string()];
    }

    let mut ends: Vec<usize> = starts[1..].to_vec();
    ends.push(line.len());
    starts
        .iter()
        .zip(ends)
        .map(|(&s, e)| line[s..e].trim().to_string())
        .filter(|segment| DECIMAL_AMOUNT.is_match(segment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(blocks: &[RawBlock]) -> Vec<&str> {
        blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn test_wallet_blocks() {
        let page = DocumentPage::new(
            1,
            "Date Transaction Details Type Amount\n\
             Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400\n\
             05:49 pm\n\
             Transaction ID T2510111749\n\
             UTR No. 528412345678\n\
             Paid by XXXXXX1234\n\
             Oct 12, 2025 Received from ASHA CREDIT ₹500\n\
             10:02 am\n",
        );
        let blocks = LineSegmenter::new(StatementFormat::WalletTransfer).segment(&page);

        assert_eq!(
            texts(&blocks),
            vec![
                "Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400 | 05:49 pm | Transaction ID T2510111749 | UTR No. 528412345678 | Paid by XXXXXX1234",
                "Oct 12, 2025 Received from ASHA CREDIT ₹500 | 10:02 am",
            ]
        );
        assert_eq!((blocks[0].first_line, blocks[0].last_line), (2, 6));
    }

    #[test]
    fn test_wallet_header_with_date_range_is_not_a_block() {
        let page = DocumentPage::new(
            1,
            "PhonePe\n\
             Transaction Statement for Oct 01, 2025 - Oct 31, 2025\n\
             Date Transaction Details Type Amount\n\
             \n\
             Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400\n\
             05:49 pm\n",
        );
        let blocks = LineSegmenter::new(StatementFormat::WalletTransfer).segment(&page);

        assert_eq!(
            texts(&blocks),
            vec!["Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400 | 05:49 pm"]
        );
        assert!(is_wallet_header("Page 1 of 3 Oct 31, 2025"));
        assert!(!is_wallet_header("Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400"));
    }

    #[test]
    fn test_wallet_lookahead_is_capped() {
        let page = DocumentPage::new(1, "Oct 11, 2025 Paid to X DEBIT ₹1\na\nb\nc\nd\ne\nf");
        let blocks = LineSegmenter::new(StatementFormat::WalletTransfer).segment(&page);
        assert_eq!(blocks[0].lines.len(), 5);
    }

    #[test]
    fn test_bank_continuation_and_noise() {
        let page = DocumentPage::new(
            1,
            "01/02/24 UPI-SWIGGY 0000412345678901 02/02/24 250.00 9,750.00\n\
             BANGALORE\n\
             Page No .: 1\n\
             ORDER 77\n\
             03/02/24 NEFT CR SALARY 03/02/24 50,000.00 59,750.00\n\
             STATEMENT SUMMARY :-\n\
             Opening Balance Dr Count Cr Count Debits Credits",
        );
        let blocks = LineSegmenter::new(StatementFormat::BankAccountStatement).segment(&page);

        assert_eq!(
            texts(&blocks),
            vec![
                "01/02/24 UPI-SWIGGY 0000412345678901 02/02/24 250.00 9,750.00 BANGALORE ORDER 77",
                "03/02/24 NEFT CR SALARY 03/02/24 50,000.00 59,750.00",
            ]
        );
        assert_eq!(blocks[0].lines.len(), 3);
        assert_eq!(blocks[0].last_line, 4);
    }

    #[test]
    fn test_split_multiple_transactions_on_one_line() {
        let line = "01/02/24 STARBUCKS REF001 02/02/24 250.00 9750.00 03/02/24 NEFT CR SALARY 03/02/24 500.00 10250.00";
        assert_eq!(
            split_transactions(line),
            vec![
                "01/02/24 STARBUCKS REF001 02/02/24 250.00 9750.00",
                "03/02/24 NEFT CR SALARY 03/02/24 500.00 10250.00",
            ]
        );
    }

    #[test]
    fn test_value_date_is_not_a_split_point() {
        let line = "01/02/24 STARBUCKS REF001 02/02/24 250.00 9750.00";
        assert_eq!(split_transactions(line), vec![line.to_string()]);
    }

    #[test]
    fn test_card_rows() {
        let page = DocumentPage::new(
            1,
            "Date Time Transaction Description Amount\n\
             15/03/2024 | 14:22\n\
             AMAZON PAY INDIA\n\
             \n\
             ₹ 1,299.00\n\
             16/03/2024] 09:10 SWIGGY BANGALORE 450.00 l\n\
             17/03/2024 | 08:00\n\
             IGST REVERSAL",
        );
        let blocks = LineSegmenter::new(StatementFormat::CreditCardStatement).segment(&page);

        assert_eq!(
            texts(&blocks),
            vec![
                "15/03/2024 | 14:22 | AMAZON PAY INDIA | ₹ 1,299.00",
                "16/03/2024] 09:10 SWIGGY BANGALORE 450.00 l",
                "17/03/2024 | 08:00 | IGST REVERSAL",
            ]
        );
    }

    #[test]
    fn test_generic_blocks() {
        let page = DocumentPage::new(
            2,
            "Account Statement\n01/02/2024 Coffee House ₹ 120.00\nTable 4\n\n02-02-2024 Metro card ₹ 50.00",
        );
        let blocks = LineSegmenter::new(StatementFormat::Unknown).segment(&page);
        assert_eq!(
            texts(&blocks),
            vec!["01/02/2024 Coffee House ₹ 120.00 Table 4", "02-02-2024 Metro card ₹ 50.00"]
        );
        assert_eq!(blocks[1].page, 2);
    }

    #[test]
    fn test_summary_text() {
        assert!(is_summary_text("STATEMENT SUMMARY :-"));
        assert!(is_summary_text("OpeningBalance 10,000.00"));
        assert!(is_summary_text("Dr Count 12 Cr Count 3 Debits 9,000 Credits 1,000"));
        assert!(!is_summary_text("Dr Count 12"));
        assert!(!is_summary_text("01/02/24 STARBUCKS"));
    }
}
