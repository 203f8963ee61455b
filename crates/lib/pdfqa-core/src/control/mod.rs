use std::{error::Error, fmt, sync::Arc};

use crate::answer::{AnswerError, AnsweringEngine};
use crate::store::{MemoryDocStore, ProcessingError};

pub mod ask;
pub mod ingest;

pub use ask::{AskReport, AskRequest};
pub use ingest::DocumentIngestRequest;

#[derive(Debug)]
pub enum ControlError {
    InvalidInput(String),
    Processing(ProcessingError),
    NotFound(String),
    Answer(AnswerError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            Self::Processing(err) => write!(f, "Error processing document: {err}"),
            Self::NotFound(document_id) => write!(f, "Document with ID {document_id} not found"),
            Self::Answer(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Processing(err) => Some(err),
            Self::Answer(err) => Some(err),
            Self::InvalidInput(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<ProcessingError> for ControlError {
    fn from(err: ProcessingError) -> Self {
        Self::Processing(err)
    }
}

impl From<AnswerError> for ControlError {
    fn from(err: AnswerError) -> Self {
        Self::Answer(err)
    }
}

/// Entry point for the request layer: owns the document store and the
/// answering engine.
pub struct QaControlPlane {
    store: MemoryDocStore,
    engine: Arc<AnsweringEngine>,
}

impl Clone for QaControlPlane {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            engine: self.engine.clone(),
        }
    }
}

impl QaControlPlane {
    #[must_use]
    pub fn new(store: MemoryDocStore, engine: AnsweringEngine) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &MemoryDocStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &AnsweringEngine {
        &self.engine
    }
}
