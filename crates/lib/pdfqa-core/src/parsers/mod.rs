//! Parsers for uploaded document bytes.
//!
//! A parser turns raw bytes into page-ordered text fragments; the document
//! store only depends on the [`PageExtractor`] seam.

pub mod pdf;

pub use pdf::{PageExtractor, PdfParseError, PdfParseOutput, PdfTextParser};
