//! XML lexer
//!
//!     Turns a raw TEI-like document into a flat list of typed items in one
//!     pass. Word-wrapped lines are joined first (see [`lines::join_lines`]),
//!     then the text is cut at tag boundaries and every markup fragment is
//!     classified. There is no tree building and no validation: close tags
//!     are not matched against open tags here, that is the walker's job.
//!
//!     Markup that cannot be read is recovered where possible and reported in
//!     [`LexOutput::diagnostics`].

pub mod attributes;
pub mod classify;
pub mod entities;
pub mod fragments;
pub mod lines;

pub use attributes::{parse_attributes, Attributes, ParsedAttributes};
pub use entities::decode_entities;
pub use lines::join_lines;

use crate::tf::diagnostics::{self, Diagnostic, Location};
use crate::tf::language::LanguageConfig;
use classify::{classify_markup, Classified};
use fragments::{fragments, CommentEnd, Fragment};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LexItem {
    OpenTag {
        name: String,
    },
    CloseTag {
        name: String,
    },
    SelfClosingTag {
        name: String,
    },
    AttributedTag {
        name: String,
        attrs: Attributes,
        self_closing: bool,
    },
    TextRun {
        content: String,
    },
    Comment,
    ProcessingInstruction,
    DocumentBoundaryStart,
    DocumentBoundaryEnd,
}

impl LexItem {
    pub fn open(name: impl Into<String>) -> Self {
        LexItem::OpenTag { name: name.into() }
    }

    pub fn close(name: impl Into<String>) -> Self {
        LexItem::CloseTag { name: name.into() }
    }

    pub fn text(content: impl Into<String>) -> Self {
        LexItem::TextRun {
            content: content.into(),
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            LexItem::OpenTag { name }
            | LexItem::CloseTag { name }
            | LexItem::SelfClosingTag { name }
            | LexItem::AttributedTag { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, LexItem::TextRun { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LexOutput {
    pub items: Vec<LexItem>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Lexer<'a> {
    corrections: &'a HashMap<String, String>,
    out: LexOutput,
    text: String,
}

impl<'a> Lexer<'a> {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let content = decode_entities(&std::mem::take(&mut self.text));
            self.out.items.push(LexItem::TextRun { content });
        }
    }

    fn push(&mut self, item: LexItem) {
        self.flush_text();
        self.out.items.push(item);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        let at = Location::Item(self.out.items.len());
        self.out.diagnostics.push(diagnostic.at(at));
    }

    fn markup(&mut self, slice: &str) {
        match classify_markup(slice, self.corrections) {
            Classified::Item(item) => self.push(item),
            Classified::Attributed { item, parsed } => {
                self.push(item);
                let index = self.out.items.len() - 1;
                if parsed.quoting_repaired {
                    self.out.diagnostics.push(
                        Diagnostic::warning(format!("repaired quoting in {}", slice))
                            .with_code(diagnostics::ATTRIBUTE_QUOTING_REPAIRED)
                            .at(Location::Item(index)),
                    );
                }
                for (key, value) in &parsed.corrected {
                    self.out.diagnostics.push(
                        Diagnostic::info(format!("corrected {}=\"{}\"", key, value))
                            .with_code(diagnostics::ATTRIBUTE_VALUE_CORRECTED)
                            .at(Location::Item(index)),
                    );
                }
                if let Some(rest) = &parsed.unparsed {
                    self.out.diagnostics.push(
                        Diagnostic::warning(format!("could not read {:?} in {}", rest, slice))
                            .with_code(diagnostics::ATTRIBUTE_UNPARSED)
                            .at(Location::Item(index)),
                    );
                }
            }
            Classified::Unrecognized => self.text.push_str(slice),
        }
    }

    fn run(mut self, source: &str) -> LexOutput {
        for (fragment, slice) in fragments(source) {
            match fragment {
                Fragment::Comment(end) => {
                    self.push(LexItem::Comment);
                    if end == CommentEnd::Unterminated {
                        self.report(
                            Diagnostic::warning("comment is never closed")
                                .with_code(diagnostics::UNTERMINATED_COMMENT),
                        );
                    }
                }
                Fragment::Declaration => self.push(LexItem::ProcessingInstruction),
                Fragment::Markup => self.markup(slice),
                Fragment::Text | Fragment::OpenAngle | Fragment::CloseAngle => {
                    self.text.push_str(slice)
                }
            }
        }
        self.flush_text();
        self.out
    }
}

/// Lexes `raw` with the line-joining markers and attribute corrections of
/// `config`.
pub fn lex(raw: &str, config: &LanguageConfig) -> LexOutput {
    lex_with(raw, &config.segment_mode.non_splitters, &config.attribute_errors)
}

pub fn lex_with(raw: &str, markers: &[char], corrections: &HashMap<String, String>) -> LexOutput {
    let joined = join_lines(raw, markers);
    let lexer = Lexer {
        corrections,
        out: LexOutput::default(),
        text: String::new(),
    };
    let out = lexer.run(&joined);
    tracing::debug!(
        items = out.items.len(),
        diagnostics = out.diagnostics.len(),
        "lexed document"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_plain(raw: &str) -> LexOutput {
        lex_with(raw, &['-'], &HashMap::new())
    }

    #[test]
    fn test_document_items_in_order() {
        let out = lex_plain("<TEI><body>\n<div n=\"1\"><p>λόγος &amp; ἀνήρ</p></div>\n</body></TEI>");
        let attrs: Attributes = [("n", "1")].into_iter().collect();
        assert_eq!(
            out.items,
            vec![
                LexItem::open("TEI"),
                LexItem::DocumentBoundaryStart,
                LexItem::text(" "),
                LexItem::AttributedTag {
                    name: "div".into(),
                    attrs,
                    self_closing: false
                },
                LexItem::open("p"),
                LexItem::text("λόγος & ἀνήρ"),
                LexItem::close("p"),
                LexItem::close("div"),
                LexItem::text(" "),
                LexItem::DocumentBoundaryEnd,
                LexItem::close("TEI"),
            ]
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_hyphenated_lines_join_into_one_run() {
        let out = lex_plain("<p>ἀνή-\nρ</p>");
        assert_eq!(out.items[1], LexItem::text("ἀνή-ρ"));
    }

    #[test]
    fn test_repairs_are_reported() {
        let out = lex_plain("<div n='1\" type=\"book\"><p rend>x</p></div>");
        let codes: Vec<&str> = out
            .diagnostics
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect();
        assert_eq!(
            codes,
            vec![
                diagnostics::ATTRIBUTE_QUOTING_REPAIRED,
                diagnostics::ATTRIBUTE_UNPARSED
            ]
        );
        assert_eq!(out.diagnostics[0].location, Some(Location::Item(0)));
        assert_eq!(out.items[1], LexItem::open("p"));
    }

    #[test]
    fn test_unterminated_comment_terminates() {
        let out = lex_plain("<p>a<!-- b <q>");
        assert_eq!(
            out.items,
            vec![LexItem::open("p"), LexItem::text("a"), LexItem::Comment]
        );
        assert!(out.diagnostics[0].has_code(diagnostics::UNTERMINATED_COMMENT));
    }

    #[test]
    fn test_stray_brackets_stay_in_text() {
        let out = lex_plain("<p>a > b</p>");
        assert_eq!(out.items[1], LexItem::text("a > b"));
    }
}
