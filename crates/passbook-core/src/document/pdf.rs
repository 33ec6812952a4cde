//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace};

use super::{pages_from_text, DocumentPage, Result, TextExtractor};
use crate::error::DocumentError;

/// Text backend for PDFs with an embedded text layer.
///
/// Pages are read through lopdf one at a time; when that yields nothing (some
/// generators use fonts lopdf cannot map) the whole document is handed to
/// pdf-extract instead.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    password: Option<String>,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self { password: None }
    }

    /// Password for encrypted statements. Without one, the empty password is tried.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn load(&self, data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc =
            Document::load_mem(data).map_err(|e| DocumentError::Unreadable(e.to_string()))?;

        let raw = if doc.is_encrypted() {
            let password = self.password.as_deref().unwrap_or("");
            if doc.decrypt(password).is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("Decrypted statement PDF");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| DocumentError::Unreadable(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data.to_vec()
        };

        Ok((doc, raw))
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<DocumentPage>> {
        let (doc, raw) = self.load(data)?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(DocumentError::NoPages);
        }
        debug!("Loaded PDF with {} pages", page_numbers.len());

        let pages: Vec<DocumentPage> = page_numbers
            .iter()
            .map(|&number| {
                let text = doc.extract_text(&[number]).unwrap_or_default();
                trace!("Page {} text: {} chars", number, text.len());
                DocumentPage::new(number, text)
            })
            .collect();

        if pages.iter().any(|p| !p.text.trim().is_empty()) {
            return Ok(pages);
        }

        debug!("lopdf returned no text, falling back to pdf-extract");
        let text = pdf_extract::extract_text_from_mem(&raw)
            .map_err(|e| DocumentError::Unreadable(e.to_string()))?;
        pages_from_text(&text)
    }
}
