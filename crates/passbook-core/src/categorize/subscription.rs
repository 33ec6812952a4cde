//! Recurring-charge detection.

use regex::Regex;
use tracing::trace;

use super::rules::detection_text;
use crate::error::{PassbookError, Result};
use crate::models::config::SubscriptionConfig;
use crate::models::transaction::SUBSCRIPTION_TAG;
use crate::models::Transaction;

/// Compiled subscription tables.
#[derive(Debug, Clone)]
pub struct SubscriptionRules {
    keywords: Vec<String>,
    patterns: Vec<(String, Regex)>,
    merchants: Vec<String>,
    shorthand_heuristic: bool,
}

impl SubscriptionRules {
    /// Compile the configured tables. Fails on the first invalid pattern.
    pub fn from_config(config: &SubscriptionConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|source| {
                Regex::new(&format!("(?i){source}"))
                    .map(|re| (source.clone(), re))
                    .map_err(|e| PassbookError::Pattern {
                        pattern: source.clone(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            keywords: config.keywords.iter().map(|k| k.to_uppercase()).collect(),
            patterns,
            merchants: config.merchants.iter().map(|m| m.to_uppercase()).collect(),
            shorthand_heuristic: config.shorthand_heuristic,
        })
    }

    /// Reason for the first matching rule over uppercased detection text.
    pub fn match_text(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        if let Some(keyword) = self.keywords.iter().find(|k| text.contains(k.as_str())) {
            return Some(format!("keyword:{}", keyword.to_lowercase()));
        }
        if let Some((source, _)) = self.patterns.iter().find(|(_, re)| re.is_match(text)) {
            return Some(format!("pattern:{source}"));
        }
        if let Some(merchant) = self.merchants.iter().find(|m| text.contains(m.as_str())) {
            return Some(format!("merchant:{}", merchant.to_lowercase()));
        }

        if text.contains("AUTO") && (text.contains("PAY") || text.contains("DEBIT")) {
            Some("heuristic:autopay".to_string())
        } else if text.contains("SI/") || text.contains("STANDING INST") {
            Some("heuristic:standing_instruction".to_string())
        } else if self.shorthand_heuristic && (text.contains("SUB ") || text.contains("SUB-")) {
            Some("heuristic:subscription_shorthand".to_string())
        } else {
            None
        }
    }
}

/// Flags transactions that look like recurring charges.
#[derive(Debug, Clone)]
pub struct SubscriptionTagger {
    rules: SubscriptionRules,
}

impl SubscriptionTagger {
    pub fn new(rules: SubscriptionRules) -> Self {
        Self { rules }
    }

    /// Tagger over the built-in tables.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(SubscriptionRules::from_config(&SubscriptionConfig::default())?))
    }

    /// Whether the transaction is a subscription, and the rule that said so.
    pub fn detect(&self, tx: &Transaction) -> (bool, String) {
        match self.rules.match_text(&detection_text(tx)) {
            Some(reason) => (true, reason),
            None => (false, String::new()),
        }
    }

    /// Set the flag and reason, and add or remove the `subscription` tag to match.
    pub fn apply(&self, tx: &mut Transaction) {
        let (is_subscription, reason) = self.detect(tx);
        if is_subscription {
            trace!("Subscription ({}): {}", reason, tx.description);
            tx.add_tag(SUBSCRIPTION_TAG);
        } else {
            tx.remove_tag(SUBSCRIPTION_TAG);
        }
        tx.is_subscription = is_subscription;
        tx.subscription_reason = reason;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAuditLine;
    use pretty_assertions::assert_eq;

    fn tx(description: &str) -> Transaction {
        Transaction {
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn tagger() -> SubscriptionTagger {
        SubscriptionTagger::with_defaults().unwrap()
    }

    #[test]
    fn test_rule_order() {
        let tagger = tagger();
        assert_eq!(tagger.detect(&tx("Netflix membership")), (true, "keyword:membership".to_string()));
        assert_eq!(
            tagger.detect(&tx("UPI AUTO DEBIT 4421")),
            (true, r"pattern:\bUPI[-\s]?AUTO(?:PAY| DEBIT)\b".to_string())
        );
        assert_eq!(tagger.detect(&tx("SPOTIFY INDIA")), (true, "merchant:spotify".to_string()));
    }

    #[test]
    fn test_heuristics() {
        let tagger = tagger();
        assert_eq!(
            tagger.detect(&tx("AUTOMATED PAY OUT")),
            (true, "heuristic:autopay".to_string())
        );
        assert_eq!(
            tagger.detect(&tx("SI/HDFC0001 LIC")),
            (true, "heuristic:standing_instruction".to_string())
        );
        assert_eq!(
            tagger.detect(&tx("SUB-ACME CLOUD")),
            (true, "heuristic:subscription_shorthand".to_string())
        );
        assert_eq!(tagger.detect(&tx("GROCERY STORE")), (false, String::new()));
        assert_eq!(tagger.detect(&Transaction::default()), (false, String::new()));
    }

    #[test]
    fn test_shorthand_can_be_disabled() {
        let config = SubscriptionConfig {
            shorthand_heuristic: false,
            ..Default::default()
        };
        let tagger = SubscriptionTagger::new(SubscriptionRules::from_config(&config).unwrap());
        assert_eq!(tagger.detect(&tx("SUB-ACME CLOUD")), (false, String::new()));
    }

    #[test]
    fn test_raw_line_is_searched() {
        let t = Transaction {
            description: "DEEP GARMENTS".to_string(),
            raw_line: RawAuditLine::new("Oct 11 Paid to DEEP GARMENTS via e-NACH"),
            ..Default::default()
        };
        assert_eq!(tagger().detect(&t), (true, "keyword:e-nach".to_string()));
    }

    #[test]
    fn test_apply_keeps_tag_in_sync() {
        let tagger = tagger();
        let mut t = tx("GITHUB SPONSORS");
        tagger.apply(&mut t);
        assert!(t.is_subscription);
        assert_eq!(t.tags, vec![SUBSCRIPTION_TAG.to_string()]);

        t.description = "GROCERY".to_string();
        tagger.apply(&mut t);
        assert!(!t.is_subscription);
        assert!(t.tags.is_empty());
        assert_eq!(t.subscription_reason, "");
    }

    #[test]
    fn test_invalid_pattern() {
        let config = SubscriptionConfig {
            patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let err = SubscriptionRules::from_config(&config).unwrap_err();
        assert!(matches!(err, PassbookError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
    }
}
