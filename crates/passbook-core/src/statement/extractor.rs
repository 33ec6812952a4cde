//! Per-block field extraction.
//!
//! Each field is resolved through ordered layers; a later layer runs only
//! when the earlier ones left the field unresolved. Debit/credit
//! disambiguation for bank column layouts consults the running balance
//! carried from the previous block of the same document.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::classifier::StatementFormat;
use super::normalize::normalize_date;
use super::rules::amounts::{card_amount, currency_amount, wallet_amount};
use super::rules::description::{
    clean_description, entity_description, narration_before_reference, stripped_description,
    trailing_details, wallet_counterparty,
};
use super::rules::patterns::{ACH_CREDIT, ACH_DEBIT, CARD_AMOUNT_LINE, CARD_ROW_START, TIME_24H};
use super::rules::{ColumnAmounts, ColumnLayout, DateExtractor, ExtractionMatch, FieldExtractor, TimeExtractor};
use super::segmenter::{is_summary_text, RawBlock};
use crate::document::EntitySpan;
use crate::error::ExtractionIssue;
use crate::models::config::ExtractionConfig;
use crate::models::{Currency, RawAuditLine, Transaction, TransactionType};

/// Credit vocabulary for bank column layouts.
const COLUMN_CREDIT_WORDS: &[&str] = &[
    "CREDIT", "DEPOSIT", "RECEIVED", "REFUND", "INTEREST", "SALARY", "DIVIDEND", "ACRC-",
    "ACHC-", "RDACR", "TOKYC",
];

const CREDIT_WORDS: &[&str] = &[
    "CREDIT", "DEPOSIT", "RECEIVED", "REFUND", "ACH C-", "ACHC-", "INTEREST", "SALARY",
    "DIVIDEND",
];

const DEBIT_WORDS: &[&str] = &[
    "DEBIT", "WITHDRAWAL", "PURCHASE", "PAYMENT", "AUTOPAY", "EMI", "UPI-", "ACH D-", "ACHD-",
];

const INTEREST_CREDIT_MARKERS: &[&str] = &["INTEREST PAID", "INTEREST CREDIT"];

/// Outcome of resolving one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome<T> {
    Resolved(T),
    Unresolved,
}

impl<T> FieldOutcome<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_ref(&self) -> FieldOutcome<&T> {
        match self {
            Self::Resolved(value) => FieldOutcome::Resolved(value),
            Self::Unresolved => FieldOutcome::Unresolved,
        }
    }

    /// Run the next layer only if this one left the field unresolved.
    pub fn or_else(self, next: impl FnOnce() -> Option<T>) -> Self {
        match self {
            Self::Resolved(_) => self,
            Self::Unresolved => next().into(),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved => None,
        }
    }
}

impl<T> From<Option<T>> for FieldOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Resolved(value),
            None => Self::Unresolved,
        }
    }
}

/// Balance figure seen on the most recent block of a document.
///
/// Created fresh for every document and threaded through its blocks in page
/// and line order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningBalance {
    previous: Option<Decimal>,
}

impl RunningBalance {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Seed with a known opening balance.
    pub fn starting_at(balance: Decimal) -> Self {
        Self {
            previous: Some(balance),
        }
    }

    pub fn previous(&self) -> Option<Decimal> {
        self.previous
    }

    pub fn update(&mut self, balance: Decimal) {
        self.previous = Some(balance);
    }
}

/// What came out of one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockExtraction {
    /// `None` when the block had no date, amount or description.
    pub transaction: Option<Transaction>,
    pub issues: Vec<ExtractionIssue>,
}

struct AmountResolution {
    amount: FieldOutcome<ExtractionMatch<Decimal>>,
    fixed_type: Option<TransactionType>,
}

/// Extracts transactions from raw blocks of one statement format.
pub struct TransactionExtractor {
    format: StatementFormat,
    config: ExtractionConfig,
}

impl TransactionExtractor {
    /// Create an extractor with default thresholds.
    pub fn new(format: StatementFormat) -> Self {
        Self::with_config(format, ExtractionConfig::default())
    }

    pub fn with_config(format: StatementFormat, config: ExtractionConfig) -> Self {
        Self { format, config }
    }

    /// Extract one block, reading and updating the running balance.
    pub fn extract(
        &self,
        block: &RawBlock,
        entities: &[EntitySpan],
        balance: &mut RunningBalance,
    ) -> BlockExtraction {
        let mut result = BlockExtraction::default();
        let text = block.text.trim();
        if text.chars().count() < self.config.min_block_len || is_summary_text(text) {
            trace!("Skipping block: {}", text);
            return result;
        }

        let first_segment = text.split_once('|').map_or(text, |(head, _)| head);
        let upper = text.to_uppercase();
        let layout = if self.format.has_columns() {
            ColumnLayout::detect(text, self.config.max_column_amount)
        } else {
            None
        };

        let date_text: FieldOutcome<String> =
            DateExtractor::new().extract(text).map(|m| m.value).into();
        let time = TimeExtractor::new().extract(text).map(|m| m.value);

        let resolution = self.resolve_amount(block, first_segment, layout.as_ref());
        let tx_type = match &layout {
            Some(layout) => self.column_type(text, &upper, layout, &resolution, balance.previous()),
            None => resolution
                .fixed_type
                .unwrap_or_else(|| keyword_type(&upper)),
        };

        let description = self
            .structural_description(block, text, first_segment, layout.as_ref())
            .or_else(|| entity_description(text, entities))
            .or_else(|| stripped_description(text));

        if !date_text.is_resolved() && !resolution.amount.is_resolved() && !description.is_resolved() {
            debug!("No transaction fields in block: {}", text);
            result.issues.push(ExtractionIssue::NoMatchBlock {
                page: block.page,
                first_line: block.first_line,
                last_line: block.last_line,
            });
            return result;
        }

        let date = match date_text.as_ref() {
            FieldOutcome::Resolved(raw) => {
                let parsed = normalize_date(raw);
                if parsed.is_none() {
                    result
                        .issues
                        .push(ExtractionIssue::UnparseableDate { text: raw.clone() });
                }
                parsed
            }
            FieldOutcome::Unresolved => None,
        };

        let block_balance = layout
            .as_ref()
            .map(|l| l.balance().value)
            .filter(|b| *b >= Decimal::ZERO && *b <= self.config.max_balance);

        let raw_line = layout
            .as_ref()
            .and_then(|l| l.reconstruct(text, tx_type))
            .unwrap_or_else(|| text.to_string());

        let amount = resolution.amount.into_option();
        let transaction = Transaction {
            date,
            original_date: date_text.into_option().unwrap_or_default(),
            time,
            description: description
                .into_option()
                .map(|d| clean_description(&d))
                .unwrap_or_default(),
            tx_type,
            amount_text: amount.as_ref().map(|m| m.source.clone()).unwrap_or_default(),
            amount_value: amount.map(|m| m.value),
            balance: block_balance,
            currency: Currency::detect(text),
            raw_line: RawAuditLine::new(raw_line),
            page: block.page,
            ..Default::default()
        };

        if let Some(b) = block_balance {
            balance.update(b);
        }

        trace!(
            "Block lines {}-{} -> {} {:?} {}",
            block.first_line,
            block.last_line,
            transaction.tx_type,
            transaction.amount_value,
            transaction.description
        );
        result.transaction = Some(transaction);
        result
    }

    fn resolve_amount(
        &self,
        block: &RawBlock,
        first_segment: &str,
        layout: Option<&ColumnLayout>,
    ) -> AmountResolution {
        let min = self.config.min_amount;
        let digits = self.config.max_amount_digits;
        let mut fixed_type = None;
        let mut amount = FieldOutcome::Unresolved;

        match self.format {
            StatementFormat::WalletTransfer => {
                if let Some((t, m)) = wallet_amount(first_segment, min) {
                    fixed_type = Some(t);
                    amount = FieldOutcome::Resolved(m);
                }
            }
            StatementFormat::CreditCardStatement => {
                let (amount_line, _) = card_parts(block);
                if let Some((m, marker)) = card_amount(&amount_line, min, digits) {
                    fixed_type = marker;
                    amount = FieldOutcome::Resolved(m);
                }
            }
            _ => match layout.map(|l| &l.columns) {
                Some(ColumnAmounts::Split { withdrawal, deposit, .. }) => {
                    if !withdrawal.value.is_zero() {
                        fixed_type = Some(TransactionType::Debit);
                        amount = FieldOutcome::Resolved(withdrawal.clone());
                    } else if !deposit.value.is_zero() {
                        fixed_type = Some(TransactionType::Credit);
                        amount = FieldOutcome::Resolved(deposit.clone());
                    }
                }
                Some(ColumnAmounts::Single { amount: figure, .. }) if !figure.value.is_zero() => {
                    amount = FieldOutcome::Resolved(figure.clone());
                }
                _ => {}
            },
        }

        AmountResolution {
            amount: amount.or_else(|| currency_amount(first_segment, min, digits)),
            fixed_type,
        }
    }

    fn column_type(
        &self,
        text: &str,
        upper: &str,
        layout: &ColumnLayout,
        resolution: &AmountResolution,
        previous: Option<Decimal>,
    ) -> TransactionType {
        if ACH_CREDIT.is_match(text) || INTEREST_CREDIT_MARKERS.iter().any(|m| upper.contains(m)) {
            return TransactionType::Credit;
        }
        if ACH_DEBIT.is_match(text) {
            return TransactionType::Debit;
        }
        if let Some(fixed) = resolution.fixed_type {
            return fixed;
        }

        if let (ColumnAmounts::Single { amount, balance }, Some(previous)) = (&layout.columns, previous) {
            let delta = balance.value - previous;
            if ((delta.abs() - amount.value.abs()).abs()) < self.config.balance_epsilon {
                if delta > Decimal::ZERO {
                    return TransactionType::Credit;
                }
                if delta < Decimal::ZERO {
                    return TransactionType::Debit;
                }
            }
        }

        if COLUMN_CREDIT_WORDS.iter().any(|w| upper.contains(w)) {
            return TransactionType::Credit;
        }
        if DEBIT_WORDS.iter().any(|w| upper.contains(w)) {
            return TransactionType::Debit;
        }
        if previous.is_none() {
            if let Some(threshold) = self.config.credit_column_offset {
                if layout.amount_offset(text) > threshold {
                    return TransactionType::Credit;
                }
            }
        }
        TransactionType::Debit
    }

    fn structural_description(
        &self,
        block: &RawBlock,
        text: &str,
        first_segment: &str,
        layout: Option<&ColumnLayout>,
    ) -> FieldOutcome<String> {
        let found = match (self.format, layout) {
            (StatementFormat::WalletTransfer, _) => wallet_counterparty(first_segment),
            (StatementFormat::CreditCardStatement, _) => {
                let (amount_line, description_lines) = card_parts(block);
                if description_lines.is_empty() {
                    stripped_description(&amount_line)
                } else {
                    Some(description_lines.join(" "))
                }
            }
            (_, Some(layout)) => {
                let narration = narration_before_reference(
                    text,
                    layout.transaction_date.end(),
                    layout.value_date.start(),
                );
                let details = trailing_details(layout.trailing_text(text));
                match (narration, details) {
                    (Some(n), Some(d)) if !n.contains(&d) => Some(format!("{n} {d}")),
                    (Some(n), _) => Some(n),
                    (None, d) => d,
                }
            }
            _ => None,
        };
        found.into()
    }
}

/// Credit vocabulary, otherwise debit.
fn keyword_type(upper: &str) -> TransactionType {
    if CREDIT_WORDS.iter().any(|w| upper.contains(w)) {
        TransactionType::Credit
    } else {
        TransactionType::Debit
    }
}

/// Split a card block into its amount line and description lines.
///
/// The amount line is the last absorbed line when it carries a figure;
/// otherwise the date line itself (minus date and time) is used.
fn card_parts(block: &RawBlock) -> (String, Vec<String>) {
    let Some(first) = block.lines.first() else {
        return (String::new(), Vec::new());
    };
    let rest = CARD_ROW_START
        .find(first)
        .map_or(first.as_str(), |m| &first[m.end()..]);
    let rest = TIME_24H.replace(rest, "").trim().to_string();

    match block.lines.split_last() {
        Some((last, middle)) if block.lines.len() > 1 && CARD_AMOUNT_LINE.is_match(last) => {
            (last.clone(), middle[1..].to_vec())
        }
        _ => (rest, block.lines[1..].to_vec()),
    }
}
