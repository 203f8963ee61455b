use std::sync::Arc;

use pdfqa_store::models::{DocumentRecord, DocumentSummary};

use super::{ControlError, QaControlPlane};

/// Input payload for ingesting an uploaded document.
#[derive(Debug, Clone)]
pub struct DocumentIngestRequest {
    pub filename: String,
    pub content: Vec<u8>,
}

impl QaControlPlane {
    /// Stores an uploaded document and extracts its text.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a blank filename and
    /// `ControlError::Processing` if the bytes cannot be persisted or parsed.
    pub async fn ingest_document(
        &self,
        request: DocumentIngestRequest,
    ) -> Result<DocumentSummary, ControlError> {
        let DocumentIngestRequest { filename, content } = request;

        if filename.trim().is_empty() {
            return Err(ControlError::InvalidInput("filename is required".to_string()));
        }

        let record = self.store.ingest(&filename, &content).await?;
        Ok(record.summary())
    }

    /// Fetches a stored record by id.
    pub async fn get_document(&self, document_id: &str) -> Option<Arc<DocumentRecord>> {
        self.store.lookup(document_id).await
    }
}
