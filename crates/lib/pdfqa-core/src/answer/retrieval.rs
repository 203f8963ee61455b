//! Retrieval-augmented answering.
//!
//! The document text is cut into passages, the passages are ranked by how
//! many question keywords they mention, and only the best `top_k` are sent to
//! the generation backend.

use std::sync::Arc;

use tracing::debug;

use super::generation::{GenerationClient, GenerationPrompt};
use super::heuristic::EMPTY_CONTEXT_ANSWER;
use super::keywords::{extract_keywords, matching_keywords};
use super::{AnswerFuture, AnswerRequest, AnsweringStrategy};

const PASSAGE_SEPARATOR: &str = "\n\n";

#[derive(Clone)]
pub struct RetrievalStrategy {
    client: Arc<dyn GenerationClient>,
    top_k: usize,
    max_passage_chars: usize,
}

impl RetrievalStrategy {
    pub const DEFAULT_TOP_K: usize = 3;
    pub const DEFAULT_MAX_PASSAGE_CHARS: usize = 1000;

    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            top_k: Self::DEFAULT_TOP_K,
            max_passage_chars: Self::DEFAULT_MAX_PASSAGE_CHARS,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_max_passage_chars(mut self, max_passage_chars: usize) -> Self {
        self.max_passage_chars = max_passage_chars.max(1);
        self
    }

    /// Best passages for `question`, returned in document order.
    ///
    /// Passages are ranked by the number of keywords they contain; ties keep
    /// document order, so a question without matches selects the leading
    /// passages.
    #[must_use]
    pub fn select_passages(&self, question: &str, context: &str) -> Vec<String> {
        let keywords = extract_keywords(question);
        let passages = split_passages(context, self.max_passage_chars);

        let mut ranked: Vec<(usize, usize)> = passages
            .iter()
            .enumerate()
            .map(|(index, passage)| (index, matching_keywords(&keywords, passage).len()))
            .collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1));
        ranked.truncate(self.top_k);

        let mut chosen: Vec<usize> = ranked.into_iter().map(|(index, _)| index).collect();
        chosen.sort_unstable();

        let mut passages: Vec<Option<String>> = passages.into_iter().map(Some).collect();
        chosen
            .into_iter()
            .filter_map(|index| passages[index].take())
            .collect()
    }
}

impl AnsweringStrategy for RetrievalStrategy {
    fn name(&self) -> &'static str {
        "retrieval"
    }

    fn answer<'a>(&'a self, request: AnswerRequest<'a>) -> AnswerFuture<'a> {
        let passages = self.select_passages(request.question, request.context);
        if passages.is_empty() {
            return Box::pin(std::future::ready(Ok(EMPTY_CONTEXT_ANSWER.to_string())));
        }
        debug!(
            document_id = request.document_id,
            passages = passages.len(),
            "retrieved passages"
        );
        let prompt =
            GenerationPrompt::for_context(request.question, &passages.join(PASSAGE_SEPARATOR));
        self.client.complete(prompt)
    }
}

/// Splits text into blank-line separated paragraphs, windowing long
/// paragraphs into chunks of at most `max_chars` characters.
fn split_passages(context: &str, max_chars: usize) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in context.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line.trim());
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
        .into_iter()
        .flat_map(|paragraph| window(&paragraph, max_chars))
        .collect()
}

fn window(paragraph: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
