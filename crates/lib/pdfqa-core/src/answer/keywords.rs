//! Question keyword extraction shared by the lexical strategies.

/// Interrogatives and determiners that survive the length filter but carry no topic.
pub const STOP_WORDS: [&str; 8] = ["what", "when", "where", "which", "whom", "whose", "that", "this"];

/// Minimum token length (exclusive) for a keyword.
const MIN_KEYWORD_CHARS: usize = 3;

/// Lower-cases `question`, splits on whitespace, trims punctuation from token
/// edges, and drops short tokens and stop words.
#[must_use]
pub fn extract_keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Keywords that occur anywhere in `text`, compared case-insensitively.
#[must_use]
pub fn matching_keywords<'k>(keywords: &'k [String], text: &str) -> Vec<&'k str> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .map(String::as_str)
        .filter(|keyword| lowered.contains(keyword))
        .collect()
}
