//! Markup classification
//!
//! Fixed precedence: body markers, processing instructions, plain
//! self-closing tags, attributed tags, close tags, open tags.

use super::attributes::{parse_attributes, ParsedAttributes};
use super::LexItem;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static BODY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<body(?:\s[^>]*)?>$").unwrap());
static BODY_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^</body\s*>$").unwrap());
static PROCESSING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^<\?.*\?>$").unwrap());
static SELF_CLOSING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^\s/>=]+)\s*/>$").unwrap());
static ATTRIBUTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<([^\s/>=]+)\s+(.*?)\s*(/?)>$").unwrap());
static CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^</\s*([^\s>]+)\s*>$").unwrap());
static OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^\s/>=]+)\s*>$").unwrap());

/// A classified markup fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Item(LexItem),
    /// An attributed tag, with the details of how its attributes were read.
    Attributed {
        item: LexItem,
        parsed: ParsedAttributes,
    },
    /// Markup that matched no tag pattern; kept as text.
    Unrecognized,
}

pub fn classify_markup(markup: &str, corrections: &HashMap<String, String>) -> Classified {
    if BODY_START.is_match(markup) {
        return Classified::Item(LexItem::DocumentBoundaryStart);
    }
    if BODY_END.is_match(markup) {
        return Classified::Item(LexItem::DocumentBoundaryEnd);
    }
    if PROCESSING.is_match(markup) {
        return Classified::Item(LexItem::ProcessingInstruction);
    }
    if let Some(caps) = SELF_CLOSING.captures(markup) {
        return Classified::Item(LexItem::SelfClosingTag {
            name: caps[1].to_string(),
        });
    }
    if let Some(caps) = ATTRIBUTED.captures(markup) {
        let name = caps[1].to_string();
        let self_closing = !caps[3].is_empty();
        let parsed = parse_attributes(&caps[2], corrections);
        if parsed.attrs.is_empty() {
            // Spaces but nothing readable as key="value".
            let item = if self_closing {
                LexItem::SelfClosingTag { name }
            } else {
                LexItem::OpenTag { name }
            };
            return Classified::Attributed { item, parsed };
        }
        let item = LexItem::AttributedTag {
            name,
            attrs: parsed.attrs.clone(),
            self_closing,
        };
        return Classified::Attributed { item, parsed };
    }
    if let Some(caps) = CLOSE.captures(markup) {
        return Classified::Item(LexItem::CloseTag {
            name: caps[1].to_string(),
        });
    }
    if let Some(caps) = OPEN.captures(markup) {
        return Classified::Item(LexItem::OpenTag {
            name: caps[1].to_string(),
        });
    }
    Classified::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(markup: &str) -> LexItem {
        match classify_markup(markup, &HashMap::new()) {
            Classified::Item(item) | Classified::Attributed { item, .. } => item,
            Classified::Unrecognized => panic!("unrecognized: {markup}"),
        }
    }

    #[rstest]
    #[case("<body>", LexItem::DocumentBoundaryStart)]
    #[case("<body xml:lang=\"grc\">", LexItem::DocumentBoundaryStart)]
    #[case("</body>", LexItem::DocumentBoundaryEnd)]
    #[case("<?xml version=\"1.0\"?>", LexItem::ProcessingInstruction)]
    #[case("<lb/>", LexItem::SelfClosingTag { name: "lb".into() })]
    #[case("<lb />", LexItem::SelfClosingTag { name: "lb".into() })]
    #[case("</p>", LexItem::CloseTag { name: "p".into() })]
    #[case("<p>", LexItem::OpenTag { name: "p".into() })]
    #[case("<titleStmt>", LexItem::OpenTag { name: "titleStmt".into() })]
    fn test_plain_markup(#[case] markup: &str, #[case] expected: LexItem) {
        assert_eq!(item(markup), expected);
    }

    #[test]
    fn test_attributed_open_and_self_closing() {
        match item(r#"<div type="textpart" n="1">"#) {
            LexItem::AttributedTag { name, attrs, self_closing } => {
                assert_eq!(name, "div");
                assert_eq!(attrs.get("n"), Some("1"));
                assert!(!self_closing);
            }
            other => panic!("unexpected {other:?}"),
        }
        match item(r#"<milestone unit="line" n="5"/>"#) {
            LexItem::AttributedTag { self_closing, attrs, .. } => {
                assert!(self_closing);
                assert_eq!(attrs.get("unit"), Some("line"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_attributes_fall_back_to_tag() {
        match classify_markup("<p rend>", &HashMap::new()) {
            Classified::Attributed { item, parsed } => {
                assert_eq!(item, LexItem::OpenTag { name: "p".into() });
                assert_eq!(parsed.unparsed.as_deref(), Some("rend"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_unrecognized() {
        assert_eq!(classify_markup("</>", &HashMap::new()), Classified::Unrecognized);
    }
}
