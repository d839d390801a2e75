//! Single-word strippers
//!
//! Narrow entry points for callers that already hold one word and only need the
//! surrounding punctuation peeled off, without a full segmentation pass.

use super::categories::{is_letter, is_word_char};

/// Splits trailing punctuation off a single word: `(word, punctuation)`.
pub fn right_strip(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .rev()
        .find(|(_, c)| is_word_char(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    text.split_at(end)
}

/// Splits leading punctuation off a single word: `(punctuation, word)`.
pub fn left_strip(text: &str) -> (&str, &str) {
    let start = text
        .char_indices()
        .find(|(_, c)| is_letter(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.split_at(start)
}
