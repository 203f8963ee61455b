//! Placeholder keyword heuristic.
//!
//! Picks the first `.`-delimited sentence that mentions a question keyword.
//! Sentence splitting is naive: abbreviations and decimals split too.

use super::keywords::{extract_keywords, matching_keywords};
use super::{AnswerFuture, AnswerRequest, AnsweringStrategy};

pub const EMPTY_CONTEXT_ANSWER: &str =
    "I couldn't find any text in the document to answer your question.";

const SENTENCE_DELIMITER: char = '.';

/// Deterministic keyword-matching strategy; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    #[must_use]
    pub fn generate(question: &str, context: &str) -> String {
        if context.trim().is_empty() {
            return EMPTY_CONTEXT_ANSWER.to_string();
        }

        let keywords = extract_keywords(question);
        let found = matching_keywords(&keywords, context);

        if !found.is_empty() {
            let sentence = context
                .split(SENTENCE_DELIMITER)
                .find(|sentence| {
                    let lowered = sentence.to_lowercase();
                    found.iter().any(|keyword| lowered.contains(keyword))
                });
            if let Some(sentence) = sentence {
                return format!(
                    "Based on the document: {}. (Note: This is a stub response. Integrate an LLM for better answers.)",
                    sentence.trim()
                );
            }
        }

        format!(
            "I found a document with {} characters of text. Your question was: '{question}'. \
             (This is a stub response. To get intelligent answers, integrate an LLM API \
             like OpenAI GPT, or implement a RAG pipeline with embeddings.)",
            context.chars().count()
        )
    }
}

impl AnsweringStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn answer<'a>(&'a self, request: AnswerRequest<'a>) -> AnswerFuture<'a> {
        let answer = Self::generate(request.question, request.context);
        Box::pin(std::future::ready(Ok(answer)))
    }
}
