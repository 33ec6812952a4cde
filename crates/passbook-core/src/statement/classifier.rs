//! Statement format detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rules::patterns::DATE_SHORT;

/// Layout family of a statement document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFormat {
    /// Wallet transaction statement (one transfer per month-name date).
    WalletTransfer,
    /// Bank account statement with date, narration, value date and amount columns.
    BankAccountStatement,
    /// Credit card statement with `date | time` rows.
    CreditCardStatement,
    /// Any other statement.
    GenericBankStatement,
    /// No markers matched. Parsed like a generic statement.
    #[default]
    Unknown,
}

impl StatementFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletTransfer => "wallet_transfer",
            Self::BankAccountStatement => "bank_account_statement",
            Self::CreditCardStatement => "credit_card_statement",
            Self::GenericBankStatement => "generic_bank_statement",
            Self::Unknown => "unknown",
        }
    }

    /// Whether blocks of this format may carry a bank column layout.
    pub fn has_columns(&self) -> bool {
        matches!(
            self,
            Self::BankAccountStatement | Self::GenericBankStatement | Self::Unknown
        )
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a document from its combined text. First match wins.
pub fn detect_format(text: &str) -> StatementFormat {
    let upper = text.to_uppercase();

    if upper.contains("TRANSACTION STATEMENT") && upper.contains("PHONEPE") {
        StatementFormat::WalletTransfer
    } else if upper.contains("HDFC BANK")
        && upper.contains("STATEMENT OF ACCOUNT")
        && DATE_SHORT.is_match(text)
    {
        StatementFormat::BankAccountStatement
    } else if upper.contains("HDFC") && upper.contains("CREDIT CARD") {
        StatementFormat::CreditCardStatement
    } else if upper.contains("STATEMENT") || upper.contains("TRANSACTION HISTORY") {
        StatementFormat::GenericBankStatement
    } else {
        StatementFormat::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wallet() {
        let text = "Transaction Statement for 98XXXXXX10\nPhonePe\nOct 11, 2025 Paid to X DEBIT ₹1";
        assert_eq!(detect_format(text), StatementFormat::WalletTransfer);
    }

    #[test]
    fn test_bank_account_needs_short_date() {
        let text = "HDFC BANK Ltd\nStatement of account\n01/02/24 STARBUCKS";
        assert_eq!(detect_format(text), StatementFormat::BankAccountStatement);

        let text = "HDFC BANK Ltd\nStatement of account\n01/02/2024 STARBUCKS";
        assert_eq!(detect_format(text), StatementFormat::GenericBankStatement);
    }

    #[test]
    fn test_credit_card() {
        let text = "HDFC Bank Credit Card Statement\n15/03/2024 | 14:22 AMAZON";
        assert_eq!(detect_format(text), StatementFormat::CreditCardStatement);
    }

    #[test]
    fn test_priority_and_fallbacks() {
        // Wallet markers win even when bank markers are present too.
        let text = "PhonePe Transaction Statement HDFC BANK Statement of account 01/02/24";
        assert_eq!(detect_format(text), StatementFormat::WalletTransfer);

        assert_eq!(detect_format("Transaction History"), StatementFormat::GenericBankStatement);
        assert_eq!(detect_format("grocery list"), StatementFormat::Unknown);
    }
}
