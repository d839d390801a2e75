//! Segmentation of raw text into punctuation/word triples
//!
//!     Every codepoint is collapsed into one of four classes (letter, mark, space,
//!     punctuation) and a text span is partitioned left to right into
//!     `(pre, core, post)` triples. The scan is a single pass over an explicit
//!     cursor, so arbitrarily long unbroken lines never grow the stack.
//!
//!     Two policies decide what happens to a non-letter run that sits between two
//!     letters without any whitespace:
//!
//!         split (glue = false): the run ends the word, unless every character of
//!             the run is a non-splitter (hyphen), in which case the run stays
//!             inside the word.
//!         glue (glue = true): the run is deleted and the letters on both sides
//!             are concatenated, unless the run holds a splitter, which forces a
//!             boundary.
//!
//!     Whitespace always forces a boundary. In split mode the triples partition
//!     the input exactly: concatenating `pre + core + post` over the output gives
//!     back the input.

pub mod categories;
pub mod splitter;
pub mod strip;

use serde::Serialize;
use std::fmt;

pub use categories::{classify, is_letter, is_word_char, CharClass};
pub use splitter::{segment, words, SegmentMode};
pub use strip::{left_strip, right_strip};

/// A `(pre, core, post)` triple.
///
/// `core` holds letters and combining marks, `pre` and `post` hold the
/// punctuation and whitespace around it. A triple with an empty `core` is pure
/// punctuation and is merged into its neighbours by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Token {
    pub pre: String,
    pub core: String,
    pub post: String,
}

impl Token {
    pub fn new(pre: impl Into<String>, core: impl Into<String>, post: impl Into<String>) -> Self {
        Self {
            pre: pre.into(),
            core: core.into(),
            post: post.into(),
        }
    }

    /// A triple made of the word alone.
    pub fn word(core: impl Into<String>) -> Self {
        Self::new("", core, "")
    }

    pub fn is_punctuation(&self) -> bool {
        self.core.is_empty()
    }

    /// `pre + core + post`
    pub fn surface(&self) -> String {
        let mut out = String::with_capacity(self.pre.len() + self.core.len() + self.post.len());
        out.push_str(&self.pre);
        out.push_str(&self.core);
        out.push_str(&self.post);
        out
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?}, {:?})", self.pre, self.core, self.post)
    }
}
