//! Document-level statement parsing.

use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::{detect_format, StatementFormat};
use super::extractor::{RunningBalance, TransactionExtractor};
use super::rules::repair_currency_glyphs;
use super::segmenter::LineSegmenter;
use crate::document::{split_pages, DocumentPage, TextExtractor};
use crate::error::{ExtractionIssue, Result};
use crate::models::config::ExtractionConfig;
use crate::models::Transaction;

/// Everything extracted from one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub source_file: String,
    pub transactions: Vec<Transaction>,
    pub metadata: ExtractionMetadata,
    /// Per-block problems; extraction continues past them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ExtractionIssue>,
}

/// Metadata about one extraction run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub format: StatementFormat,
    pub page_count: usize,
    pub total_blocks: usize,
    pub dropped_blocks: usize,
    pub total_transactions: usize,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

/// Trait for statement parsing.
pub trait DocumentParser {
    /// Parse the pages of one document into transactions.
    fn parse_pages(&self, pages: &[DocumentPage], source_file: &str) -> ExtractionResult;
}

/// Detects the format, segments every page and extracts each block.
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    config: ExtractionConfig,
    format: Option<StatementFormat>,
    opening_balance: Option<Decimal>,
}

impl StatementParser {
    /// Create a parser with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip detection and parse as the given format.
    pub fn with_format(mut self, format: StatementFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Seed the running balance, for statements that continue an earlier one.
    pub fn with_opening_balance(mut self, balance: Decimal) -> Self {
        self.opening_balance = Some(balance);
        self
    }

    /// Run a text backend over raw bytes and parse the result.
    pub fn process_bytes(
        &self,
        backend: &dyn TextExtractor,
        data: &[u8],
        source_file: &str,
    ) -> Result<ExtractionResult> {
        let pages = backend.extract_pages(data)?;
        Ok(self.process_document(&pages, source_file))
    }

    /// Parse plain text, pages separated by form feeds.
    pub fn process_text(&self, text: &str, source_file: &str) -> ExtractionResult {
        self.process_document(&split_pages(text), source_file)
    }

    /// Parse the pages of one document.
    ///
    /// The running balance starts fresh (or at the opening balance) and is
    /// carried across pages in order.
    pub fn process_document(&self, pages: &[DocumentPage], source_file: &str) -> ExtractionResult {
        let start = Instant::now();

        let repaired: Vec<DocumentPage>;
        let pages = if self.config.repair_ocr_glyphs {
            repaired = pages
                .iter()
                .map(|p| DocumentPage {
                    text: repair_currency_glyphs(&p.text),
                    ..p.clone()
                })
                .collect();
            &repaired[..]
        } else {
            pages
        };

        let mut issues = Vec::new();
        let format = self.format.unwrap_or_else(|| {
            let combined: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
            detect_format(&combined.join("\n"))
        });
        if format == StatementFormat::Unknown {
            warn!("No statement markers in {}, parsing as generic", source_file);
            issues.push(ExtractionIssue::UnknownFormat);
        }
        debug!("Detected format {} for {}", format, source_file);

        let segmenter = LineSegmenter::with_config(format, &self.config);
        let extractor = TransactionExtractor::with_config(format, self.config.clone());
        let mut balance = match self.opening_balance {
            Some(opening) => RunningBalance::starting_at(opening),
            None => RunningBalance::new(),
        };

        let mut transactions = Vec::new();
        let mut total_blocks = 0;
        let mut dropped_blocks = 0;

        for page in pages {
            let blocks = segmenter.segment(page);
            total_blocks += blocks.len();

            for block in &blocks {
                let extraction = extractor.extract(block, &page.entities, &mut balance);
                issues.extend(extraction.issues);
                match extraction.transaction {
                    Some(mut tx) => {
                        tx.source_file = source_file.to_string();
                        transactions.push(tx);
                    }
                    None => dropped_blocks += 1,
                }
            }
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Parsed {}: {} transactions from {} blocks ({} dropped) in {}ms",
            source_file,
            transactions.len(),
            total_blocks,
            dropped_blocks,
            processing_time_ms
        );

        ExtractionResult {
            source_file: source_file.to_string(),
            metadata: ExtractionMetadata {
                format,
                page_count: pages.len(),
                total_blocks,
                dropped_blocks,
                total_transactions: transactions.len(),
                processing_time_ms,
                processed_at: Utc::now(),
            },
            transactions,
            issues,
        }
    }
}

impl DocumentParser for StatementParser {
    fn parse_pages(&self, pages: &[DocumentPage], source_file: &str) -> ExtractionResult {
        self.process_document(pages, source_file)
    }
}
