//! Amount extraction layers for statement blocks.

use rust_decimal::Decimal;

use super::patterns::{
    CURRENCY_AMOUNT, DATE_SHORT, DECIMAL_AMOUNT, SIGNED_CARD_AMOUNT, SPLIT_DECIMAL_AMOUNT,
    WALLET_TYPE_AMOUNT,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::TransactionType;
use crate::statement::normalize::normalize_amount;

/// Decimal amount extractor (`1,234.56`), used for column scans and balances.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DECIMAL_AMOUNT
            .find_iter(text)
            .filter_map(|m| {
                normalize_amount(m.as_str())
                    .map(|value| ExtractionMatch::new(value, m.as_str(), m.start(), m.end()))
            })
            .collect()
    }
}

/// Wallet layer: the amount right after `DEBIT`/`CREDIT` and a currency glyph.
///
/// `segment` is the part of the block before the first `|`.
pub fn wallet_amount(
    segment: &str,
    min_amount: Decimal,
) -> Option<(TransactionType, ExtractionMatch<Decimal>)> {
    WALLET_TYPE_AMOUNT.captures_iter(segment).find_map(|caps| {
        let keyword = caps.get(1)?;
        let m = caps.get(2)?;
        let value = normalize_amount(m.as_str())?;
        if value < min_amount {
            return None;
        }
        let tx_type = if keyword.as_str().eq_ignore_ascii_case("CREDIT") {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        };
        Some((tx_type, ExtractionMatch::new(value, m.as_str(), m.start(), m.end())))
    })
}

/// Generic layer: a currency-glyph-prefixed number.
///
/// Numbers with more than `max_digits` digits are taken to be account or
/// reference numbers and skipped.
pub fn currency_amount(
    segment: &str,
    min_amount: Decimal,
    max_digits: usize,
) -> Option<ExtractionMatch<Decimal>> {
    CURRENCY_AMOUNT.captures_iter(segment).find_map(|caps| {
        let m = caps.get(1)?;
        let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
        if digits > max_digits {
            return None;
        }
        let value = normalize_amount(m.as_str())?;
        (value >= min_amount).then(|| ExtractionMatch::new(value, m.as_str(), m.start(), m.end()))
    })
}

/// Card-row layer: the amount on a credit-card amount line.
///
/// Returns the amount and the type fixed by a trailing `Cr`/`Dr` marker.
pub fn card_amount(
    line: &str,
    min_amount: Decimal,
    max_digits: usize,
) -> Option<(ExtractionMatch<Decimal>, Option<TransactionType>)> {
    if let Some(caps) = SIGNED_CARD_AMOUNT.captures(line) {
        if let (Some(m), Some(marker)) = (caps.get(1), caps.get(2)) {
            if let Some(value) = normalize_amount(m.as_str()) {
                let tx_type = if marker.as_str().eq_ignore_ascii_case("cr") {
                    TransactionType::Credit
                } else {
                    TransactionType::Debit
                };
                return Some((
                    ExtractionMatch::new(value, m.as_str(), m.start(), m.end()),
                    Some(tx_type),
                ));
            }
        }
    }

    if let Some(caps) = SPLIT_DECIMAL_AMOUNT.captures(line) {
        if let (Some(whole), Some(frac)) = (caps.get(1), caps.get(2)) {
            if let Some(value) = normalize_amount(&format!("{}.{}", whole.as_str(), frac.as_str())) {
                return Some((
                    ExtractionMatch::new(value, &caps[0], whole.start(), frac.end()),
                    None,
                ));
            }
        }
    }

    if let Some(found) = currency_amount(line, min_amount, max_digits) {
        return Some((found, None));
    }

    let decimals = AmountExtractor::new().extract_all(line);
    let picked = match decimals.len() {
        0 => return None,
        1 => decimals.into_iter().next(),
        n => decimals.into_iter().nth(n - 2),
    };
    picked.map(|m| (m, None))
}

/// Amount columns of a bank statement row, read after the value date.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAmounts {
    /// Withdrawal, deposit and balance columns all present.
    Split {
        withdrawal: ExtractionMatch<Decimal>,
        deposit: ExtractionMatch<Decimal>,
        balance: ExtractionMatch<Decimal>,
    },
    /// One transaction amount followed by the balance.
    Single {
        amount: ExtractionMatch<Decimal>,
        balance: ExtractionMatch<Decimal>,
    },
    /// Only the balance is visible.
    BalanceOnly { balance: ExtractionMatch<Decimal> },
}

/// A bank statement row laid out as
/// `date narration ref value-date [withdrawal] [deposit] balance`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// Transaction date (first short date).
    pub transaction_date: ExtractionMatch<String>,
    /// Value date (second short date).
    pub value_date: ExtractionMatch<String>,
    /// Figures after the value date.
    pub columns: ColumnAmounts,
}

impl ColumnLayout {
    /// Detect the layout. Needs two short dates and at least one figure after
    /// the second; figures above `max_amount` are ignored.
    pub fn detect(text: &str, max_amount: Decimal) -> Option<Self> {
        let mut dates = DATE_SHORT.captures_iter(text).filter_map(|caps| caps.get(1));
        let first = dates.next()?;
        let second = dates.next()?;

        let mut figures = AmountExtractor::new()
            .extract_all(text)
            .into_iter()
            .filter(|m| m.start() > second.end() && m.value.abs() <= max_amount);

        let columns = match (figures.next(), figures.next(), figures.next()) {
            (Some(withdrawal), Some(deposit), Some(balance)) => ColumnAmounts::Split {
                withdrawal,
                deposit,
                balance,
            },
            (Some(amount), Some(balance), None) => ColumnAmounts::Single { amount, balance },
            (Some(balance), None, _) => ColumnAmounts::BalanceOnly { balance },
            _ => return None,
        };

        Some(Self {
            transaction_date: date_match(first),
            value_date: date_match(second),
            columns,
        })
    }

    pub fn balance(&self) -> &ExtractionMatch<Decimal> {
        match &self.columns {
            ColumnAmounts::Split { balance, .. }
            | ColumnAmounts::Single { balance, .. }
            | ColumnAmounts::BalanceOnly { balance } => balance,
        }
    }

    fn first_figure(&self) -> &ExtractionMatch<Decimal> {
        match &self.columns {
            ColumnAmounts::Split { withdrawal, .. } => withdrawal,
            ColumnAmounts::Single { amount, .. } => amount,
            ColumnAmounts::BalanceOnly { balance } => balance,
        }
    }

    /// Characters between the end of the value date and the first figure.
    pub fn amount_offset(&self, text: &str) -> usize {
        let start = self.value_date.end();
        let end = self.first_figure().start();
        text.get(start..end).map_or(0, |gap| gap.chars().count())
    }

    /// Free text after the balance figure.
    pub fn trailing_text<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.balance().end()..).unwrap_or("").trim()
    }

    /// Rebuild the row with explicit columns:
    /// `prefix | Withdrawal: x | Deposit: [empty] | Balance: y | trailing`.
    ///
    /// Returns `None` when only the balance was found.
    pub fn reconstruct(&self, text: &str, tx_type: TransactionType) -> Option<String> {
        let prefix = text.get(..self.value_date.end())?.trim_end();
        let (withdrawal, deposit) = match &self.columns {
            ColumnAmounts::Split { withdrawal, deposit, .. } => {
                (non_zero_source(withdrawal), non_zero_source(deposit))
            }
            ColumnAmounts::Single { amount, .. } if tx_type == TransactionType::Credit => {
                (None, Some(amount.source.as_str()))
            }
            ColumnAmounts::Single { amount, .. } => (Some(amount.source.as_str()), None),
            ColumnAmounts::BalanceOnly { .. } => return None,
        };

        let mut parts = vec![
            prefix.to_string(),
            format!("Withdrawal: {}", withdrawal.unwrap_or("[empty]")),
            format!("Deposit: {}", deposit.unwrap_or("[empty]")),
            format!("Balance: {}", self.balance().source),
        ];
        let trailing = self.trailing_text(text);
        if !trailing.is_empty() {
            parts.push(trailing.to_string());
        }
        Some(parts.join(" | "))
    }
}

fn date_match(m: regex::Match<'_>) -> ExtractionMatch<String> {
    ExtractionMatch::new(m.as_str().to_string(), m.as_str(), m.start(), m.end())
}

fn non_zero_source(m: &ExtractionMatch<Decimal>) -> Option<&str> {
    (!m.value.is_zero()).then_some(m.source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_wallet_amount() {
        let (tx_type, m) = wallet_amount("Oct 11, 2025 Paid to DEEP GARMENTS DEBIT ₹1,400", Decimal::ONE).unwrap();
        assert_eq!(tx_type, TransactionType::Debit);
        assert_eq!(m.value, dec("1400.00"));
        assert_eq!(m.source, "1,400");

        let (tx_type, _) = wallet_amount("Received from RAHUL CREDIT ₹ 500.50", Decimal::ONE).unwrap();
        assert_eq!(tx_type, TransactionType::Credit);
    }

    #[test]
    fn test_wallet_amount_rejects_fragments() {
        assert!(wallet_amount("Paid to X DEBIT ₹0.50", Decimal::ONE).is_none());
        assert!(wallet_amount("Paid to X DEBIT 1,400", Decimal::ONE).is_none());
    }

    #[test]
    fn test_currency_amount_skips_long_numbers() {
        let m = currency_amount("₹123456789 then ₹ 99.00", Decimal::ONE, 8).unwrap();
        assert_eq!(m.value, dec("99.00"));
        assert!(currency_amount("no glyph 250.00", Decimal::ONE, 8).is_none());
    }

    #[test]
    fn test_column_layout_single_amount() {
        let text = "01/02/24 STARBUCKS REF001 02/02/24 250.00 9750.00";
        let layout = ColumnLayout::detect(text, dec("10000000")).unwrap();

        assert_eq!(layout.transaction_date.value, "01/02/24");
        assert_eq!(layout.value_date.value, "02/02/24");
        match &layout.columns {
            ColumnAmounts::Single { amount, balance } => {
                assert_eq!(amount.value, dec("250.00"));
                assert_eq!(balance.value, dec("9750.00"));
            }
            other => panic!("unexpected columns: {other:?}"),
        }
        assert_eq!(layout.amount_offset(text), 1);
    }

    #[test]
    fn test_column_layout_needs_two_dates() {
        assert!(ColumnLayout::detect("01/02/24 STARBUCKS 250.00 9750.00", dec("10000000")).is_none());
        assert!(ColumnLayout::detect("01/02/24 STARBUCKS 02/02/24", dec("10000000")).is_none());
    }

    #[test]
    fn test_column_layout_split_and_cap() {
        let text = "03/02/24 NEFT CR SALARY 03/02/24 0.00 50,000.00 59,750.00 99999999.00";
        let layout = ColumnLayout::detect(text, dec("10000000")).unwrap();
        match &layout.columns {
            ColumnAmounts::Split { withdrawal, deposit, balance } => {
                assert!(withdrawal.value.is_zero());
                assert_eq!(deposit.value, dec("50000.00"));
                assert_eq!(balance.value, dec("59750.00"));
            }
            other => panic!("unexpected columns: {other:?}"),
        }
    }

    #[test]
    fn test_reconstruct_raw_line() {
        let text = "01/02/24 UPI-SWIGGY 0000412345678901 02/02/24 250.00 9,750.00 Bangalore Swiggy";
        let layout = ColumnLayout::detect(text, dec("10000000")).unwrap();
        assert_eq!(
            layout.reconstruct(text, TransactionType::Debit).unwrap(),
            "01/02/24 UPI-SWIGGY 0000412345678901 02/02/24 | Withdrawal: 250.00 | Deposit: [empty] | Balance: 9,750.00 | Bangalore Swiggy"
        );
        assert_eq!(layout.trailing_text(text), "Bangalore Swiggy");
    }

    #[test]
    fn test_card_amount_markers() {
        let (m, tx_type) = card_amount("45,260.00 Cr", Decimal::ONE, 8).unwrap();
        assert_eq!(m.value, dec("45260.00"));
        assert_eq!(tx_type, Some(TransactionType::Credit));

        let (m, tx_type) = card_amount("₹1,234 56", Decimal::ONE, 8).unwrap();
        assert_eq!(m.value, dec("1234.56"));
        assert_eq!(tx_type, None);

        let (m, _) = card_amount("1,499.00 120.00", Decimal::ONE, 8).unwrap();
        assert_eq!(m.value, dec("1499.00"));
    }
}
