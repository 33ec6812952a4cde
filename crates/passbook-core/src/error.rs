//! Error types for the passbook-core library.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the passbook library.
#[derive(Error, Debug)]
pub enum PassbookError {
    /// A source document could not be turned into text.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Category store or override error.
    #[error("category error: {0}")]
    Category(#[from] CategoryError),

    /// A heuristic table entry could not be compiled.
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a text extraction backend. Fatal for one document only.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document bytes could not be parsed.
    #[error("failed to read document: {0}")]
    Unreadable(String),

    /// The document is encrypted and the password was missing or wrong.
    #[error("document is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// Every page came back without text.
    #[error("no text could be extracted")]
    NoText,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// No backend handles this kind of file.
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Errors from category definitions and manual overrides.
#[derive(Error, Debug)]
pub enum CategoryError {
    /// Override requested without a group key.
    #[error("group key is required")]
    MissingGroupKey,

    /// Custom category label was empty.
    #[error("category name is required")]
    EmptyLabel,

    /// Custom category label has no alphanumeric characters.
    #[error("category name must contain letters or numbers")]
    InvalidLabel,

    /// A category with this slug already exists.
    #[error("category already exists: {0}")]
    AlreadyExists(String),

    /// Override target is not a known category slug.
    #[error("invalid category: {0}")]
    InvalidOverride(String),

    /// Store state could not be written or read back.
    #[error("failed to persist category store: {0}")]
    Persist(String),
}

/// Recoverable problems met while extracting one document.
///
/// These never abort processing; they are collected on the extraction result
/// so callers can surface them next to the transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionIssue {
    /// A date-like token matched but no known format parsed it.
    #[error("unparseable date {text:?}")]
    UnparseableDate { text: String },

    /// An amount-like token matched but did not parse as a decimal.
    #[error("unparseable amount {text:?}")]
    UnparseableAmount { text: String },

    /// A segmented block produced no date, amount or description.
    #[error("no transaction fields in block on page {page}, lines {first_line}-{last_line}")]
    NoMatchBlock {
        page: u32,
        first_line: usize,
        last_line: usize,
    },

    /// No format markers matched; the generic parser was used.
    #[error("unknown statement format, using generic parser")]
    UnknownFormat,
}

/// Result type for the passbook library.
pub type Result<T> = std::result::Result<T, PassbookError>;
