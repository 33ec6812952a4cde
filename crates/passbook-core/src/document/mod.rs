//! Source documents: the text extraction boundary.
//!
//! The engine never reads PDFs or images itself. A [`TextExtractor`] backend
//! turns document bytes into per-page text, optionally annotated with named
//! entity spans, and everything downstream works on [`DocumentPage`]s.

#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "pdf")]
pub use pdf::PdfTextExtractor;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Named-entity categories a recognizer may attach to page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Org,
    Per,
    Loc,
    Misc,
    Date,
    Money,
}

/// A recognized entity occurring in page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: EntityLabel,
    pub text: String,
}

impl EntitySpan {
    pub fn new(label: EntityLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Text of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Plain text, lines separated by `\n`.
    pub text: String,
    /// Entity spans, used only as a description fallback.
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

impl DocumentPage {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<EntitySpan>) -> Self {
        self.entities = entities;
        self
    }
}

/// A backend that turns document bytes into page text.
pub trait TextExtractor {
    /// Extract the text of every page, in page order.
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<DocumentPage>>;
}

/// Backend for text already extracted elsewhere (OCR output, copy-paste).
///
/// Form feeds separate pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<DocumentPage>> {
        let text = String::from_utf8_lossy(data);
        pages_from_text(&text)
    }
}

/// Split text on form feeds into pages numbered from 1.
pub fn split_pages(text: &str) -> Vec<DocumentPage> {
    text.split('\u{000c}')
        .enumerate()
        .map(|(i, page)| DocumentPage::new(i as u32 + 1, page))
        .collect()
}

/// Like [`split_pages`], but blank text is an error.
pub(crate) fn pages_from_text(text: &str) -> Result<Vec<DocumentPage>> {
    if text.trim().is_empty() {
        return Err(DocumentError::NoText);
    }
    Ok(split_pages(text))
}

/// Pick a backend from the file extension.
#[cfg_attr(not(feature = "pdf"), allow(unused_variables))]
pub fn extractor_for_path(
    path: &Path,
    password: Option<&str>,
) -> Result<Box<dyn TextExtractor + Send + Sync>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        #[cfg(feature = "pdf")]
        "pdf" => {
            let extractor = PdfTextExtractor::new();
            Ok(Box::new(match password {
                Some(password) => extractor.with_password(password),
                None => extractor,
            }))
        }
        "txt" | "text" => Ok(Box::new(PlainTextExtractor)),
        other => Err(DocumentError::Unsupported(other.to_string())),
    }
}
