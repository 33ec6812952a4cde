//! Transaction records produced by extraction and enriched by reconciliation.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tag attached to transactions detected as recurring charges.
pub const SUBSCRIPTION_TAG: &str = "subscription";

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransactionType {
    Debit,
    Credit,
    #[default]
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency tag detected from glyphs or codes in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    /// Detect the currency of a block of statement text.
    pub fn detect(text: &str) -> Self {
        if text.contains('$') || text.contains("USD") {
            Self::Usd
        } else if text.contains('€') || text.contains("EUR") {
            Self::Eur
        } else {
            Self::Inr
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Render an amount for display, e.g. `₹1,400.00`, `$12.00`, `EUR 5.00`.
    pub fn format_amount(&self, amount: Decimal) -> String {
        let mut value = amount.abs().round_dp(2);
        value.rescale(2);
        let text = value.to_string();
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
        match self {
            Self::Inr => format!("{sign}₹{grouped}.{frac}"),
            Self::Usd => format!("{sign}${grouped}.{frac}"),
            Self::Eur => format!("{sign}EUR {grouped}.{frac}"),
        }
    }
}

/// Where a resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    Manual,
    Auto,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

/// Audit copy of the source text a transaction was extracted from.
///
/// Kept apart from the display fields so an unresolved description is never
/// silently replaced by raw statement text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAuditLine(String);

impl RawAuditLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawAuditLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single statement transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Normalized calendar date, if the date text parsed.
    #[serde(rename = "normalizedDate")]
    pub date: Option<NaiveDate>,

    /// Date text as it appeared in the statement.
    pub original_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    pub description: String,

    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Amount text as it appeared in the statement (empty if unresolved).
    #[serde(rename = "amount")]
    pub amount_text: String,

    /// Normalized amount with two decimal places.
    pub amount_value: Option<Decimal>,

    /// Running balance figure the block exposed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,

    pub currency: Currency,

    pub raw_line: RawAuditLine,

    pub source_file: String,

    /// 1-based page the block came from.
    pub page: u32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_subscription: bool,

    #[serde(default)]
    pub subscription_reason: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_source: Option<CategorySource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_group_key: Option<String>,
}

impl Transaction {
    /// Add a tag, keeping the list free of duplicates and in insertion order.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Amount formatted with its currency symbol, if resolved.
    pub fn display_amount(&self) -> Option<String> {
        self.amount_value.map(|v| self.currency.format_amount(v))
    }
}
