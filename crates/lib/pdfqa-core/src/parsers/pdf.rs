use std::{error::Error, fmt};

use lopdf::Document;

/// Turns raw document bytes into page-ordered text fragments.
///
/// Implementations run on the blocking pool, so they may be CPU heavy.
pub trait PageExtractor: Send + Sync {
    /// Extracts one text fragment per page, in page order.
    ///
    /// # Errors
    /// Returns `PdfParseError` if the bytes cannot be parsed.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, PdfParseError>;
}

/// Output from parsing a PDF document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfParseOutput {
    pub pages: Vec<String>,
}

impl PdfParseOutput {
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Error type for PDF parse failures.
#[derive(Debug)]
pub struct PdfParseError {
    page: Option<u32>,
    message: String,
}

impl PdfParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            page: None,
            message: message.into(),
        }
    }

    fn on_page(page: u32, message: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            message: message.into(),
        }
    }

    /// Page number the failure occurred on, when known.
    #[must_use]
    pub const fn page(&self) -> Option<u32> {
        self.page
    }
}

impl fmt::Display for PdfParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "PDF parse error on page {page}: {}", self.message),
            None => write!(f, "PDF parse error: {}", self.message),
        }
    }
}

impl Error for PdfParseError {}

impl From<lopdf::Error> for PdfParseError {
    fn from(err: lopdf::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::io::Error> for PdfParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Text extractor for PDF documents backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextParser;

impl PdfTextParser {
    /// Parses PDF bytes into per-page text.
    ///
    /// Pages without text operators (scanned or image-only pages) yield an
    /// empty fragment rather than an error.
    ///
    /// # Errors
    /// Returns `PdfParseError` if the document structure is invalid or a page's
    /// content cannot be decoded.
    pub fn parse(bytes: &[u8]) -> Result<PdfParseOutput, PdfParseError> {
        let document = Document::load_mem(bytes)?;
        let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let text = document
                .extract_text(&[page_number])
                .map_err(|err| PdfParseError::on_page(page_number, err.to_string()))?;
            pages.push(text);
        }

        Ok(PdfParseOutput { pages })
    }
}

impl PageExtractor for PdfTextParser {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, PdfParseError> {
        Self::parse(bytes).map(|output| output.pages)
    }
}
