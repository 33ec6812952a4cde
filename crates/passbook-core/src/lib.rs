//! Core library for bank and wallet statement processing.
//!
//! This crate provides:
//! - Text backends for statement documents (PDF text layer, plain text)
//! - Format detection and line segmentation into transaction blocks
//! - Layered field extraction with running-balance debit/credit resolution
//! - Cross-document reconciliation with duplicate grouping
//! - Keyword categorization, manual overrides and subscription tagging

pub mod categorize;
pub mod document;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod statement;

pub use categorize::{
    CategoryRules, CategorySnapshot, CategoryStore, Categorizer, SubscriptionRules,
    SubscriptionTagger,
};
pub use document::{extractor_for_path, DocumentPage, EntityLabel, EntitySpan, PlainTextExtractor, TextExtractor};
#[cfg(feature = "pdf")]
pub use document::PdfTextExtractor;
pub use error::{CategoryError, DocumentError, ExtractionIssue, PassbookError, Result};
pub use models::{
    CategoryDefinition, CategorySource, Currency, PassbookConfig, RawAuditLine, Transaction,
    TransactionType,
};
pub use reconcile::{
    CollapsedTransaction, DocumentOutcome, DuplicateGroup, FileSummary, ReconcileSummary,
    ReconciledResult, Reconciler,
};
pub use statement::{ExtractionResult, StatementFormat, StatementParser};
