//! Category definitions.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Slug every resolution falls back to.
pub const FALLBACK_CATEGORY: &str = "others";

/// Slug used for credits with no better match.
pub const INCOME_CATEGORY: &str = "income";

/// Override value that clears a manual assignment.
pub const AUTO_CATEGORY: &str = "auto";

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// A selectable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Stable slug, e.g. `mutual_fund`.
    pub value: String,
    /// Display label, e.g. `Mutual Fund`.
    pub label: String,
}

impl CategoryDefinition {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Built-in categories in display order.
pub fn builtin_categories() -> Vec<CategoryDefinition> {
    [
        ("foods", "Foods & Dining"),
        ("fuel", "Fuel"),
        ("recharge", "Recharge & Utilities"),
        ("mutual_fund", "Mutual Fund"),
        ("credit_bills", "Credit Bills"),
        (INCOME_CATEGORY, "Income"),
        (FALLBACK_CATEGORY, "Others"),
    ]
    .into_iter()
    .map(|(value, label)| CategoryDefinition::new(value, label))
    .collect()
}

/// Turn a display label into a slug: lowercase, runs of non-alphanumerics
/// become a single underscore, no leading or trailing underscores.
pub fn slugify(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Merge built-in and custom categories. Built-ins win on slug collision.
pub fn merge_definitions(
    builtins: &[CategoryDefinition],
    custom: &[CategoryDefinition],
) -> Vec<CategoryDefinition> {
    let mut merged: Vec<CategoryDefinition> = builtins.to_vec();
    for def in custom {
        if !merged.iter().any(|d| d.value == def.value) {
            merged.push(def.clone());
        }
    }
    merged
}
