use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::PAGE_SEPARATOR;

/// Stored representation of one ingested document.
///
/// Records are created once by the document store and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub page_count: usize,
    pub text: String,
    pub storage_path: PathBuf,
    pub ingested_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Joins page fragments into the stored text layout, one separator after each page.
    #[must_use]
    pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
        let capacity = pages.iter().map(|page| page.as_ref().len() + 1).sum();
        let mut text = String::with_capacity(capacity);
        for page in pages {
            text.push_str(page.as_ref());
            text.push(PAGE_SEPARATOR);
        }
        text
    }

    /// Character length of the extracted text.
    #[must_use]
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            document_id: self.id.clone(),
            filename: self.filename.clone(),
            page_count: self.page_count,
            text_length: self.text_length(),
        }
    }
}

/// Outward projection of a record; carries the text length instead of the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub page_count: usize,
    pub text_length: usize,
}

/// Answer produced for a question against one document's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub answer_text: String,
    pub context_snippet: String,
    pub document_id: String,
}
