//! Category resolution and subscription tagging.

mod rules;
mod store;
mod subscription;

pub use rules::{detection_text, CategoryRules};
pub use store::{CategorySnapshot, CategoryStore};
pub use subscription::{SubscriptionRules, SubscriptionTagger};

use crate::models::category::FALLBACK_CATEGORY;
use crate::models::{CategorySource, Transaction};

/// Resolves the category of a duplicate group.
///
/// Works from an immutable store snapshot, so one run sees one consistent set
/// of definitions and overrides.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: CategoryRules,
    snapshot: CategorySnapshot,
}

impl Categorizer {
    pub fn new(rules: CategoryRules, snapshot: CategorySnapshot) -> Self {
        Self { rules, snapshot }
    }

    /// Built-in rules and definitions, no overrides.
    pub fn with_defaults() -> Self {
        let rules = CategoryRules::default();
        let snapshot = CategorySnapshot {
            definitions: rules.definitions().to_vec(),
            ..Default::default()
        };
        Self::new(rules, snapshot)
    }

    pub fn snapshot(&self) -> &CategorySnapshot {
        &self.snapshot
    }

    /// A valid manual override wins; otherwise the keyword tables decide.
    /// Automatic results outside the known definitions become `others`.
    pub fn resolve_category(&self, group_key: &str, tx: &Transaction) -> (String, CategorySource) {
        if let Some(manual) = self.snapshot.override_for(group_key) {
            return (manual.to_string(), CategorySource::Manual);
        }

        let auto = self.rules.auto_category(tx);
        if self.snapshot.is_valid(&auto) {
            (auto, CategorySource::Auto)
        } else {
            (FALLBACK_CATEGORY.to_string(), CategorySource::Auto)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::builtin_categories;
    use crate::models::config::{CategoryConfig, CategoryKeywordRule};
    use crate::models::TransactionType;
    use pretty_assertions::assert_eq;

    fn tx(description: &str, tx_type: TransactionType) -> Transaction {
        Transaction {
            description: description.to_string(),
            tx_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_manual_override_wins() {
        let store = CategoryStore::in_memory(builtin_categories());
        store.set_override("2024-02-01:250.00", Some("fuel")).unwrap();
        let categorizer = Categorizer::new(CategoryRules::default(), store.snapshot());

        assert_eq!(
            categorizer.resolve_category("2024-02-01:250.00", &tx("SWIGGY", TransactionType::Debit)),
            ("fuel".to_string(), CategorySource::Manual)
        );
        assert_eq!(
            categorizer.resolve_category("2024-02-02:250.00", &tx("SWIGGY", TransactionType::Debit)),
            ("foods".to_string(), CategorySource::Auto)
        );
    }

    #[test]
    fn test_stale_override_falls_back_to_auto() {
        let mut snapshot = CategorySnapshot {
            definitions: builtin_categories(),
            ..Default::default()
        };
        snapshot.overrides.insert("k".to_string(), "travel".to_string());
        let categorizer = Categorizer::new(CategoryRules::default(), snapshot);
        assert_eq!(
            categorizer.resolve_category("k", &tx("NEFT CR SALARY", TransactionType::Credit)),
            ("income".to_string(), CategorySource::Auto)
        );
    }

    #[test]
    fn test_unknown_auto_result_becomes_others() {
        let config = CategoryConfig {
            rules: vec![CategoryKeywordRule {
                category: "pets".to_string(),
                keywords: vec!["SUPERTAILS".to_string()],
                credit_only: false,
            }],
            ..Default::default()
        };
        let categorizer = Categorizer::new(
            CategoryRules::from_config(&config),
            CategorySnapshot {
                definitions: builtin_categories(),
                ..Default::default()
            },
        );
        assert_eq!(
            categorizer.resolve_category("k", &tx("SUPERTAILS", TransactionType::Debit)),
            ("others".to_string(), CategorySource::Auto)
        );
    }

    #[test]
    fn test_resolution_is_pure() {
        let categorizer = Categorizer::with_defaults();
        let t = tx("HP PAY FUEL STATION", TransactionType::Debit);
        assert_eq!(categorizer.resolve_category("k", &t), categorizer.resolve_category("k", &t));
        assert_eq!(categorizer.resolve_category("k", &t).0, "fuel");
    }
}
