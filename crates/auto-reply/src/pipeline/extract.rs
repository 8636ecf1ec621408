//! PDF text extraction.

use std::{borrow::Cow, path::Path};

use {lopdf::Document, tracing::debug};

/// Appended when extracted text is cut to the character budget.
pub const TRUNCATION_MARKER: &str = "...[text truncated because it is too long]";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("could not read the PDF: {0}")]
    Load(#[from] lopdf::Error),

    #[error("the PDF has no pages")]
    NoPages,

    #[error("page {page} does not exist")]
    MissingPage { page: usize },

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// A paginated document whose pages can be read as text.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of the one-based `page`.
    fn page_text(&self, page: usize) -> Result<String, ExtractionError>;
}

pub struct PdfDocument {
    doc: Document,
    /// PDF page numbers in reading order.
    pages: Vec<u32>,
}

impl PdfDocument {
    pub fn load(path: &Path) -> Result<Self, ExtractionError> {
        Ok(Self::from_document(Document::load(path)?))
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, ExtractionError> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().keys().copied().collect();
        Self { doc, pages }
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String, ExtractionError> {
        let number = page
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(ExtractionError::MissingPage { page })?;
        Ok(self.doc.extract_text(&[*number])?)
    }
}

/// Extract the first `max_pages` pages of the PDF at `path`.
pub fn extract_pdf_text(path: &Path, max_pages: usize) -> Result<String, ExtractionError> {
    let doc = PdfDocument::load(path)?;
    extract_pages(&doc, max_pages)
}

/// Concatenate page texts with page markers. Pages without text get a
/// placeholder line; pages past `max_pages` are summarised in one note.
pub fn extract_pages(source: &impl PageSource, max_pages: usize) -> Result<String, ExtractionError> {
    let total = source.page_count();
    if total == 0 {
        return Err(ExtractionError::NoPages);
    }

    let mut text = String::new();
    for page in 1..=total.min(max_pages) {
        match source.page_text(page) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&format!("\n--- Page {page} ---\n{page_text}\n"));
            },
            Ok(_) => {
                text.push_str(&format!("\n--- Page {page} has no extractable text ---\n"));
            },
            Err(e) => {
                debug!(page, error = %e, "page text extraction failed");
                text.push_str(&format!("\n--- Page {page} has no extractable text ---\n"));
            },
        }
    }

    if total > max_pages {
        text.push_str(&format!(
            "\n--- (Text extracted from the first {max_pages} of {total} pages only; {} pages skipped) ---\n",
            total - max_pages
        ));
    }

    debug!(pages = total, chars = text.chars().count(), "extracted PDF text");
    Ok(text)
}

/// Keep at most `max_chars` characters, marking the cut.
pub fn truncate(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
    }
}
