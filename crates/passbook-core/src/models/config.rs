//! Configuration structures for the statement pipeline.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::{builtin_categories, CategoryDefinition, INCOME_CATEGORY};

/// Main configuration for the passbook pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassbookConfig {
    /// Field extraction thresholds.
    pub extraction: ExtractionConfig,

    /// Category definitions and keyword tables.
    pub categories: CategoryConfig,

    /// Recurring-charge detection tables.
    pub subscriptions: SubscriptionConfig,

    /// Where the category store keeps its files.
    pub storage: StorageConfig,
}

impl PassbookConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Smallest currency-prefixed amount accepted by the wallet and generic layers.
    pub min_amount: Decimal,

    /// Largest figure accepted in a bank column layout.
    pub max_column_amount: Decimal,

    /// Largest figure accepted as a running balance.
    pub max_balance: Decimal,

    /// Currency-prefixed numbers with more digits than this are rejected.
    pub max_amount_digits: usize,

    /// Tolerance when matching a balance delta against an amount.
    pub balance_epsilon: Decimal,

    /// Amount columns starting further than this many characters after the
    /// value date are read as deposits. `None` disables the tie-break.
    pub credit_column_offset: Option<usize>,

    /// Blocks shorter than this are dropped.
    pub min_block_len: usize,

    /// Lines a wallet block may absorb after its date line.
    pub wallet_lookahead: usize,

    /// Continuation lines a bank or generic block may absorb.
    pub continuation_lines: usize,

    /// Lines a card row may look ahead for its amount line.
    pub card_lookahead: usize,

    /// Rewrite OCR-mangled currency glyphs (`DEBIT 2 1,400.00`, `Rs.`) before segmenting.
    pub repair_ocr_glyphs: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::ONE,
            max_column_amount: Decimal::from(10_000_000),
            max_balance: Decimal::from(100_000_000),
            max_amount_digits: 8,
            balance_epsilon: Decimal::new(1, 2),
            credit_column_offset: Some(40),
            min_block_len: 10,
            wallet_lookahead: 4,
            continuation_lines: 3,
            card_lookahead: 5,
            repair_ocr_glyphs: false,
        }
    }
}

/// One keyword table entry for automatic categorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryKeywordRule {
    /// Category slug assigned on a match.
    pub category: String,

    /// Uppercase substrings searched in the detection text.
    pub keywords: Vec<String>,

    /// Only eligible for credit transactions.
    #[serde(default)]
    pub credit_only: bool,
}

impl CategoryKeywordRule {
    fn new(category: &str, keywords: &[&str], credit_only: bool) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            credit_only,
        }
    }
}

/// Category configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Built-in category definitions.
    pub definitions: Vec<CategoryDefinition>,

    /// Keyword tables, checked in order. First match wins.
    pub rules: Vec<CategoryKeywordRule>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            definitions: builtin_categories(),
            rules: vec![
                CategoryKeywordRule::new(
                    "foods",
                    &[
                        "SWIGGY", "ZOMATO", "FOOD", "DINING", "RESTAURANT", "PIZZA", "CAFE",
                        "DOMINOS", "EATS", "BBQ NATION", "KFC", "MCDONALD",
                    ],
                    false,
                ),
                CategoryKeywordRule::new(
                    "fuel",
                    &[
                        "FUEL", "PETROL", "DIESEL", "HPCL", "IOCL", "BPCL", "SHELL", "ESSAR",
                        "FILLING STATION", "AUTOFUEL", "HP PAY",
                    ],
                    false,
                ),
                CategoryKeywordRule::new(
                    "recharge",
                    &[
                        "RECHARGE", "FASTAG", "MOBILE", "PREPAID", "POSTPAID", "DTH",
                        "BROADBAND", "AIRTEL", "JIO", "VODAFONE", "VI ", "BSNL", "DATA CARD",
                    ],
                    false,
                ),
                CategoryKeywordRule::new(
                    "mutual_fund",
                    &[
                        "MUTUAL FUND", "SIP", "SYSTEMATIC INVEST", "AMC", "CAMS", "KFINTECH",
                        "MFU", "GROWW", "ZERODHA COIN", "CLEARFUNDS", "INVESTMENT SERVICES",
                    ],
                    false,
                ),
                CategoryKeywordRule::new(
                    "credit_bills",
                    &[
                        "CREDIT CARD PAYMENT", "CARD PAYMENT", "CC PAYMENT", "HDFC BANK CARD",
                        "ICICI CREDIT CARD", "BILLDESK", "STATEMENT PAYMENT", "CARDSETTLEMENT",
                        "HDFCBANKCC", "PAYTM CREDIT CARD",
                    ],
                    false,
                ),
                CategoryKeywordRule::new(
                    INCOME_CATEGORY,
                    &[
                        "SALARY", "PAYROLL", "NEFT CR", "REFUND", "INTEREST", "DIVIDEND",
                        "REIMBURSEMENT", "CREDITED BY", "CREDIT FROM", "PAYMENT RECEIVED",
                    ],
                    true,
                ),
            ],
        }
    }
}

/// Recurring-charge detection tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Uppercase substrings, checked first.
    pub keywords: Vec<String>,

    /// Case-insensitive regular expressions, checked second.
    pub patterns: Vec<String>,

    /// Known subscription merchants, checked third.
    pub merchants: Vec<String>,

    /// Treat `SUB ` / `SUB-` as a subscription marker. Known to over-match.
    pub shorthand_heuristic: bool,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            keywords: owned(&[
                "SUBSCRIPTION", "SUBSCR", "MEMBERSHIP", "RENEWAL", "AUTO PAY", "AUTOPAY",
                "AUTO-DEBIT", "RECURRING", "MONTHLY PLAN", "MONTHLY FEE", "MONTHLY CHARGES",
                "PLAN FEE", "UPI AUTOPAY", "UPI-AUTOPAY", "SI-HDFC", "STANDING INSTRUCTION",
                "MANDATE", "E-NACH", "ENACH", "SI BILLDESK", "AUTO PAYMENT",
                "AUTOMATIC PAYMENT", "AUTO-RENEW", "AUTO RENEW",
            ]),
            patterns: owned(&[
                r"\bUPI[-\s]?AUTO(?:PAY| DEBIT)\b",
                r"\bAUTO[-\s]?RENEW(AL)?\b",
                r"\bRECURRING\s+PAYMENT\b",
                r"\bSI\s*/\s*ACH\b",
                r"\bAUTH\s*MANDATE\b",
            ]),
            merchants: owned(&[
                "NETFLIX", "SPOTIFY", "YOUTUBE", "GOOGLE STORAGE", "GOOGLE ONE", "AMAZON PRIME",
                "PRIME VIDEO", "HOTSTAR", "SONYLIV", "ZEE5", "APPLE.COM", "APPLE BILL", "ICLOUD",
                "MICROSOFT", "OFFICE 365", "OFFICE365", "GITHUB", "FIGMA", "ADOBE", "NOTION",
                "ZOOM", "DROPBOX", "CANVA", "OPENAI", "ANTHROPIC", "CLAUDE.AI", "CURSOR",
                "SLACK", "ATLASSIAN", "JIRA", "SWIGGY ONE", "BIGBASKET BBSTAR",
                "URBANCLAP PLUS", "CRED PRIME", "PHONEPE PASS", "SPOTIFY AB", "QUILLBOT",
                "SUBSTACK", "MIRROR AI",
            ]),
            shorthand_heuristic: true,
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the override map and custom categories.
    /// Falls back to the platform data directory when unset.
    pub data_dir: Option<PathBuf>,
}
