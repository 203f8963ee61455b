use serde::{Deserialize, Serialize};

use super::{ControlError, QaControlPlane};

/// Input payload for asking a question about a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub document_id: String,
    pub question: String,
}

/// Answer to a question, echoing the question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskReport {
    pub question: String,
    pub answer: String,
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_used: Option<String>,
}

impl QaControlPlane {
    /// Answers a question against a stored document's text.
    ///
    /// The document is resolved before the answering engine runs, so an
    /// unknown id never reaches the backend.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` for a blank question,
    /// `ControlError::NotFound` for an unknown document, and
    /// `ControlError::Answer` if the answering backend fails.
    pub async fn ask(&self, request: AskRequest) -> Result<AskReport, ControlError> {
        let AskRequest {
            document_id,
            question,
        } = request;

        if question.trim().is_empty() {
            return Err(ControlError::InvalidInput("question is required".to_string()));
        }

        let Some(record) = self.store.lookup(&document_id).await else {
            return Err(ControlError::NotFound(document_id));
        };

        let answer = self
            .engine
            .answer(&question, &record.text, &record.id)
            .await?;

        Ok(AskReport {
            question,
            answer: answer.answer_text,
            document_id: answer.document_id,
            context_used: Some(answer.context_snippet),
        })
    }
}
