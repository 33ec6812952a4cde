//! Keyword tables for automatic categorization.

use crate::models::category::{FALLBACK_CATEGORY, INCOME_CATEGORY};
use crate::models::config::{CategoryConfig, CategoryKeywordRule};
use crate::models::{CategoryDefinition, Transaction, TransactionType};
use crate::statement::rules::patterns::collapse_whitespace;

/// Text the category and subscription heuristics search: description and raw
/// line, whitespace-collapsed and uppercased.
pub fn detection_text(tx: &Transaction) -> String {
    let parts: Vec<&str> = [tx.description.as_str(), tx.raw_line.as_str()]
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();
    collapse_whitespace(&parts.join(" ")).to_uppercase()
}

/// Immutable category keyword tables, checked in order.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: Vec<CategoryKeywordRule>,
    definitions: Vec<CategoryDefinition>,
}

impl CategoryRules {
    pub fn from_config(config: &CategoryConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|rule| CategoryKeywordRule {
                keywords: rule.keywords.iter().map(|k| k.to_uppercase()).collect(),
                ..rule.clone()
            })
            .collect();
        Self {
            rules,
            definitions: config.definitions.clone(),
        }
    }

    /// Built-in definitions these rules were configured with.
    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }

    /// First rule with a keyword in `text`. Credit-only rules are skipped for
    /// anything but credits.
    pub fn match_keywords(&self, text: &str, tx_type: TransactionType) -> Option<&str> {
        let is_credit = tx_type == TransactionType::Credit;
        self.rules
            .iter()
            .filter(|rule| is_credit || !rule.credit_only)
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|rule| rule.category.as_str())
    }

    /// Keyword match, else `income` for credits, else `others`.
    pub fn auto_category(&self, tx: &Transaction) -> String {
        let text = detection_text(tx);
        if let Some(category) = self.match_keywords(&text, tx.tx_type) {
            return category.to_string();
        }
        if tx.tx_type == TransactionType::Credit {
            INCOME_CATEGORY.to_string()
        } else {
            FALLBACK_CATEGORY.to_string()
        }
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::from_config(&CategoryConfig::default())
    }
}
