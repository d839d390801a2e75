//! Iterative triple splitter

use super::categories::{is_letter, is_word_char};
use super::Token;
use serde::{Deserialize, Serialize};

/// Characters that keep a hyphenated line-wrap inside one word by default.
pub const DEFAULT_NON_SPLITTERS: [char; 2] = ['-', '\u{00AD}'];

/// Tokenizer policy for non-letter runs inside a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMode {
    /// Delete interior runs instead of splitting on them.
    pub glue: bool,
    /// Characters that force a boundary in glue mode.
    pub splitters: Vec<char>,
    /// Characters that keep a word together in split mode.
    pub non_splitters: Vec<char>,
}

impl SegmentMode {
    pub fn split() -> Self {
        Self {
            glue: false,
            splitters: Vec::new(),
            non_splitters: DEFAULT_NON_SPLITTERS.to_vec(),
        }
    }

    pub fn glue() -> Self {
        Self {
            glue: true,
            ..Self::split()
        }
    }

    pub fn with_splitters(mut self, splitters: impl IntoIterator<Item = char>) -> Self {
        self.splitters = splitters.into_iter().collect();
        self
    }

    pub fn with_non_splitters(mut self, non_splitters: impl IntoIterator<Item = char>) -> Self {
        self.non_splitters = non_splitters.into_iter().collect();
        self
    }

    pub fn is_non_splitter(&self, c: char) -> bool {
        self.non_splitters.contains(&c)
    }

    fn boundary(&self, run: &[char]) -> Boundary {
        if let Some(pos) = run.iter().rposition(|c| c.is_whitespace()) {
            return Boundary::Break(pos + 1);
        }
        if self.glue {
            match run.iter().rposition(|c| self.splitters.contains(c)) {
                Some(pos) => Boundary::Break(pos + 1),
                None => Boundary::Delete,
            }
        } else if run.iter().all(|c| self.non_splitters.contains(c)) {
            Boundary::Keep
        } else {
            Boundary::Break(run.len())
        }
    }
}

impl Default for SegmentMode {
    fn default() -> Self {
        Self::split()
    }
}

/// What to do with a non-letter run found between two letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// The run stays inside the word.
    Keep,
    /// The run is dropped and the word continues.
    Delete,
    /// The word ends. `run[..n]` becomes its `post`, the rest the next `pre`.
    Break(usize),
}

struct Cursor<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a [char] {
        let start = self.pos;
        while self.pos < self.chars.len() && pred(self.chars[self.pos]) {
            self.pos += 1;
        }
        &self.chars[start..self.pos]
    }
}

/// Partitions `text` into triples, left to right.
///
/// A text without letters yields a single punctuation-only triple (or nothing
/// when it is empty). Trailing punctuation becomes the `post` of the last word.
pub fn segment(text: &str, mode: &SegmentMode) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut cursor = Cursor {
        chars: &chars,
        pos: 0,
    };
    let mut tokens = Vec::new();

    let mut pre: String = cursor.take_while(|c| !is_letter(c)).iter().collect();
    if cursor.at_end() {
        if !pre.is_empty() {
            tokens.push(Token::new(pre, "", ""));
        }
        return tokens;
    }

    while !cursor.at_end() {
        let mut core = String::new();
        loop {
            core.extend(cursor.take_while(is_word_char));
            let run = cursor.take_while(|c| !is_letter(c));
            if cursor.at_end() {
                tokens.push(Token::new(
                    std::mem::take(&mut pre),
                    std::mem::take(&mut core),
                    run.iter().collect::<String>(),
                ));
                break;
            }
            match mode.boundary(run) {
                Boundary::Keep => core.extend(run),
                Boundary::Delete => {}
                Boundary::Break(at) => {
                    let post: String = run[..at].iter().collect();
                    let next_pre: String = run[at..].iter().collect();
                    tokens.push(Token::new(
                        std::mem::replace(&mut pre, next_pre),
                        std::mem::take(&mut core),
                        post,
                    ));
                    break;
                }
            }
        }
    }
    tokens
}

/// The word cores of `text`, punctuation dropped.
pub fn words(text: &str, mode: &SegmentMode) -> Vec<String> {
    segment(text, mode)
        .into_iter()
        .filter(|t| !t.core.is_empty())
        .map(|t| t.core)
        .collect()
}
