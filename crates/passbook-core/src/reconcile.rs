//! Cross-document reconciliation.
//!
//! Transactions from every document of a run are merged, tagged, grouped by
//! `(date, amount)` and categorized once per group. Groups with more than one
//! member are reported as duplicates; every group yields one collapsed
//! transaction.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::categorize::{Categorizer, SubscriptionTagger};
use crate::error::ExtractionIssue;
use crate::models::{CategorySource, Currency, RawAuditLine, Transaction, TransactionType};
use crate::statement::{normalize_amount, normalize_date, round_amount, ExtractionResult, StatementFormat};

/// What became of one input document.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Parsed(ExtractionResult),
    /// The text backend failed; the rest of the run carries on.
    Unreadable { source_file: String, error: String },
}

impl DocumentOutcome {
    pub fn source_file(&self) -> &str {
        match self {
            Self::Parsed(result) => &result.source_file,
            Self::Unreadable { source_file, .. } => source_file,
        }
    }
}

/// One member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMember {
    pub source_file: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub time: Option<String>,
    pub raw_line: RawAuditLine,
}

impl From<&Transaction> for DuplicateMember {
    fn from(tx: &Transaction) -> Self {
        Self {
            source_file: tx.source_file.clone(),
            description: tx.description.clone(),
            tx_type: tx.tx_type,
            time: tx.time.clone(),
            raw_line: tx.raw_line.clone(),
        }
    }
}

/// Transactions sharing a date and amount, seen more than once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub group_key: String,
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub transactions: Vec<DuplicateMember>,
}

/// The single record standing in for a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapsedTransaction {
    pub duplicate_group_key: String,
    pub duplicate_count: usize,
    #[serde(rename = "normalizedDate")]
    pub date: Option<NaiveDate>,
    pub original_date: String,
    pub time: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(rename = "amount")]
    pub amount_text: String,
    pub amount_value: Option<Decimal>,
    pub currency: Currency,
    pub raw_line: RawAuditLine,
    /// One file name, or `Multiple (N files)`.
    pub source_file: String,
    pub source_files: Vec<String>,
    pub tags: Vec<String>,
    pub is_subscription: bool,
    pub subscription_reason: String,
    pub category: String,
    pub category_source: CategorySource,
    /// Positions of the members in [`ReconciledResult::transactions`].
    pub member_indices: Vec<usize>,
}

impl CollapsedTransaction {
    /// Amount formatted with its currency symbol, if resolved.
    pub fn display_amount(&self) -> Option<String> {
        self.amount_value.map(|v| self.currency.format_amount(v))
    }
}

/// Per-document line of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub filename: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<StatementFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ExtractionIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub total_transactions: usize,
    pub collapsed_transactions: usize,
    pub duplicate_groups: usize,
    /// Transactions that belong to a group with more than one member.
    pub duplicate_transactions: usize,
    /// Transactions folded away by collapsing.
    pub duplicates_collapsed: usize,
    pub total_files: usize,
    pub processed_files: usize,
    pub files: Vec<FileSummary>,
}

/// Output of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledResult {
    pub transactions: Vec<Transaction>,
    pub collapsed_transactions: Vec<CollapsedTransaction>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub summary: ReconcileSummary,
}

/// Merges document outcomes into one categorized, de-duplicated view.
pub struct Reconciler<'a> {
    categorizer: &'a Categorizer,
    tagger: &'a SubscriptionTagger,
}

impl<'a> Reconciler<'a> {
    pub fn new(categorizer: &'a Categorizer, tagger: &'a SubscriptionTagger) -> Self {
        Self { categorizer, tagger }
    }

    /// Reconcile every outcome of a run, in input order.
    pub fn reconcile(&self, outcomes: Vec<DocumentOutcome>) -> ReconciledResult {
        let total_files = outcomes.len();
        let mut transactions: Vec<Transaction> = Vec::new();
        let mut files = Vec::with_capacity(total_files);

        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Parsed(result) => {
                    let mut issues = result.issues;
                    let count = result.transactions.len();
                    for mut tx in result.transactions {
                        if tx.source_file.is_empty() {
                            tx.source_file = result.source_file.clone();
                        }
                        renormalize(&mut tx, &mut issues);
                        self.tagger.apply(&mut tx);
                        transactions.push(tx);
                    }
                    files.push(FileSummary {
                        filename: result.source_file,
                        count,
                        format: Some(result.metadata.format),
                        error: None,
                        issues,
                    });
                }
                DocumentOutcome::Unreadable { source_file, error } => {
                    warn!("Skipping unreadable {}: {}", source_file, error);
                    files.push(FileSummary {
                        filename: source_file,
                        count: 0,
                        format: None,
                        error: Some(error),
                        issues: Vec::new(),
                    });
                }
            }
        }

        let groups = group_by_key(&transactions);
        debug!("{} transactions in {} groups", transactions.len(), groups.len());

        for (key, members) in &groups {
            let (category, source) = self
                .categorizer
                .resolve_category(key, &transactions[members[0]]);
            for &idx in members {
                let tx = &mut transactions[idx];
                tx.duplicate_group_key = Some(key.clone());
                tx.category = Some(category.clone());
                tx.category_source = Some(source);
            }
        }

        let duplicate_groups: Vec<DuplicateGroup> = groups
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(key, members)| {
                let first = &transactions[members[0]];
                DuplicateGroup {
                    group_key: key.clone(),
                    date: first.date,
                    amount: first.amount_value,
                    transactions: members.iter().map(|&i| (&transactions[i]).into()).collect(),
                }
            })
            .collect();

        let collapsed_transactions: Vec<CollapsedTransaction> = groups
            .iter()
            .map(|(key, members)| collapse(key, members, &transactions))
            .collect();

        let duplicate_transactions: usize = duplicate_groups.iter().map(|g| g.transactions.len()).sum();
        let summary = ReconcileSummary {
            total_transactions: transactions.len(),
            collapsed_transactions: collapsed_transactions.len(),
            duplicate_groups: duplicate_groups.len(),
            duplicate_transactions,
            duplicates_collapsed: duplicate_transactions - duplicate_groups.len(),
            total_files,
            processed_files: files.iter().filter(|f| f.error.is_none()).count(),
            files,
        };

        info!(
            "Reconciled {} transactions from {} files into {} ({} duplicate groups)",
            summary.total_transactions,
            summary.total_files,
            summary.collapsed_transactions,
            summary.duplicate_groups
        );

        ReconciledResult {
            transactions,
            collapsed_transactions,
            duplicate_groups,
            summary,
        }
    }
}

/// Duplicate-group key: `date:amount`, or `__ungrouped__{index}` when either
/// is missing.
pub fn group_key(index: usize, tx: &Transaction) -> String {
    match (tx.date, tx.amount_value) {
        (Some(date), Some(amount)) => format!("{}:{:.2}", date.format("%Y-%m-%d"), amount),
        _ => format!("__ungrouped__{index}"),
    }
}

/// Re-run normalization; already normalized values are left as they are.
fn renormalize(tx: &mut Transaction, issues: &mut Vec<ExtractionIssue>) {
    if tx.date.is_none() && !tx.original_date.trim().is_empty() {
        tx.date = normalize_date(&tx.original_date);
        if tx.date.is_none() {
            push_unique(issues, ExtractionIssue::UnparseableDate {
                text: tx.original_date.clone(),
            });
        }
    }

    tx.amount_value = match tx.amount_value {
        Some(value) => Some(round_amount(value)),
        None if !tx.amount_text.trim().is_empty() => {
            let value = normalize_amount(&tx.amount_text);
            if value.is_none() {
                push_unique(issues, ExtractionIssue::UnparseableAmount {
                    text: tx.amount_text.clone(),
                });
            }
            value
        }
        None => None,
    };
}

fn push_unique(issues: &mut Vec<ExtractionIssue>, issue: ExtractionIssue) {
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}

/// Group transaction indices by key, groups in first-seen order.
fn group_by_key(transactions: &[Transaction]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (idx, tx) in transactions.iter().enumerate() {
        let key = group_key(idx, tx);
        match positions.get(&key) {
            Some(&pos) => groups[pos].1.push(idx),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![idx]));
            }
        }
    }
    groups
}

fn collapse(key: &str, members: &[usize], transactions: &[Transaction]) -> CollapsedTransaction {
    let representative = &transactions[members[0]];
    let group: Vec<&Transaction> = members.iter().map(|&i| &transactions[i]).collect();

    let sources: Vec<String> = group
        .iter()
        .filter(|tx| !tx.source_file.is_empty())
        .map(|tx| tx.source_file.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let source_file = match sources.len() {
        0 => representative.source_file.clone(),
        1 => sources[0].clone(),
        n => format!("Multiple ({n} files)"),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in group.iter().flat_map(|tx| tx.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    CollapsedTransaction {
        duplicate_group_key: key.to_string(),
        duplicate_count: members.len(),
        date: representative.date,
        original_date: representative.original_date.clone(),
        time: representative.time.clone(),
        description: representative.description.clone(),
        tx_type: representative.tx_type,
        amount_text: representative.amount_text.clone(),
        amount_value: representative.amount_value,
        currency: representative.currency,
        raw_line: representative.raw_line.clone(),
        source_file,
        source_files: sources,
        tags,
        is_subscription: group.iter().any(|tx| tx.is_subscription),
        subscription_reason: group
            .iter()
            .map(|tx| tx.subscription_reason.as_str())
            .find(|r| !r.is_empty())
            .unwrap_or_default()
            .to_string(),
        category: representative.category.clone().unwrap_or_default(),
        category_source: representative.category_source.unwrap_or(CategorySource::Auto),
        member_indices: members.to_vec(),
    }
}
