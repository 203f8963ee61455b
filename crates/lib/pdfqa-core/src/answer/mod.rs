//! Answering engine and its pluggable strategies.
//!
//! The engine owns one [`AnsweringStrategy`] chosen at construction time and
//! adds the parts of the answer contract every strategy shares: the bounded
//! context snippet and the optional answer timeout.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use pdfqa_store::models::Answer;
use pdfqa_store::schema::{CONTEXT_SNIPPET_CHARS, CONTEXT_SNIPPET_ELLIPSIS};
use tracing::{debug, warn};

pub mod generation;
pub mod heuristic;
pub mod keywords;
pub mod retrieval;

pub use generation::{
    ChatCompletionsClient,
    GenerationClient,
    GenerationFuture,
    GenerationPrompt,
    GenerationStrategy,
};
pub use heuristic::{EMPTY_CONTEXT_ANSWER, HeuristicStrategy};
pub use retrieval::RetrievalStrategy;

pub type AnswerFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AnswerError>> + Send + 'a>>;

#[derive(Debug)]
pub enum AnswerError {
    BackendUnavailable { backend: String, reason: String },
}

impl AnswerError {
    pub fn backend_unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AnswerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable { backend, reason } => {
                write!(f, "answering backend '{backend}' unavailable: {reason}")
            }
        }
    }
}

impl Error for AnswerError {}

/// Inputs for a single answer.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub question: &'a str,
    pub context: &'a str,
    /// Passed through for traceability.
    pub document_id: &'a str,
}

/// Replaceable algorithm behind [`AnsweringEngine::answer`].
pub trait AnsweringStrategy: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Produces the answer text for a request.
    fn answer<'a>(&'a self, request: AnswerRequest<'a>) -> AnswerFuture<'a>;
}

/// Stateless answering engine holding the active strategy.
#[derive(Clone)]
pub struct AnsweringEngine {
    strategy: Arc<dyn AnsweringStrategy>,
    timeout: Option<Duration>,
}

impl fmt::Debug for AnsweringEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnsweringEngine")
            .field("strategy", &self.strategy.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for AnsweringEngine {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicStrategy))
    }
}

impl AnsweringEngine {
    #[must_use]
    pub fn new(strategy: Arc<dyn AnsweringStrategy>) -> Self {
        Self {
            strategy,
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Answers `question` from `context`.
    ///
    /// # Errors
    /// Returns `AnswerError::BackendUnavailable` if the strategy fails or the
    /// configured timeout elapses. The heuristic strategy never fails.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        document_id: &str,
    ) -> Result<Answer, AnswerError> {
        let request = AnswerRequest {
            question,
            context,
            document_id,
        };
        let pending = self.strategy.answer(request);
        let answer_text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                AnswerError::backend_unavailable(
                    self.strategy.name(),
                    format!("no answer within {}ms", limit.as_millis()),
                )
            })?,
            None => pending.await,
        }
        .inspect_err(|err| warn!(document_id, error = %err, "answer failed"))?;

        debug!(document_id, strategy = self.strategy.name(), "answer produced");
        Ok(Answer {
            answer_text,
            context_snippet: context_snippet(context),
            document_id: document_id.to_string(),
        })
    }
}

/// First [`CONTEXT_SNIPPET_CHARS`] characters of `context`, with an ellipsis
/// when anything was cut.
#[must_use]
pub fn context_snippet(context: &str) -> String {
    match context.char_indices().nth(CONTEXT_SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}{CONTEXT_SNIPPET_ELLIPSIS}", &context[..cut]),
        None => context.to_string(),
    }
}
