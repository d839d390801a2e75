//! Header metadata
//!
//! Text of configured header tags in front of `<body>` is collected into a
//! flat map. A concatenated field joins all of its text under the field's own
//! name; other fields store each child tag's text under the child's name
//! (`titleStmt` yields `title`, `author`, ...).

use crate::tf::lexing::LexItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    pub tag: String,
    pub concat: bool,
    pub delimiter: String,
    pub terminator: String,
}

impl HeaderField {
    pub fn per_child(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            concat: false,
            delimiter: ", ".to_string(),
            terminator: String::new(),
        }
    }

    pub fn concatenated(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            concat: true,
            delimiter: ", ".to_string(),
            terminator: ".".to_string(),
        }
    }
}

/// The TEI header fields read by default.
pub fn default_header_fields() -> Vec<HeaderField> {
    vec![
        HeaderField::per_child("titleStmt"),
        HeaderField::concatenated("publicationStmt"),
        HeaderField::concatenated("sourceDesc"),
        HeaderField::concatenated("license"),
        HeaderField::concatenated("availability"),
    ]
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn read_header(items: &[LexItem], fields: &[HeaderField]) -> BTreeMap<String, String> {
    let mut open: Vec<&str> = Vec::new();
    let mut parts: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut delimiters: BTreeMap<String, &HeaderField> = BTreeMap::new();

    for item in items {
        match item {
            LexItem::DocumentBoundaryStart => break,
            LexItem::OpenTag { name } => open.push(name),
            LexItem::AttributedTag {
                name,
                self_closing: false,
                ..
            } => open.push(name),
            LexItem::CloseTag { name } => {
                if let Some(pos) = open.iter().rposition(|t| t == name) {
                    open.truncate(pos);
                }
            }
            LexItem::TextRun { content } => {
                let text = collapse_whitespace(content);
                if text.is_empty() {
                    continue;
                }
                let Some(field) = fields.iter().find(|f| open.contains(&f.tag.as_str())) else {
                    continue;
                };
                let key = if field.concat {
                    field.tag.clone()
                } else {
                    open.last().map(|t| t.to_string()).unwrap_or_else(|| field.tag.clone())
                };
                delimiters.insert(key.clone(), field);
                parts.entry(key).or_default().push(text);
            }
            _ => {}
        }
    }

    parts
        .into_iter()
        .map(|(key, texts)| {
            let field = delimiters[&key];
            let mut value = texts.join(&field.delimiter);
            if field.concat && !value.ends_with(field.terminator.as_str()) {
                value.push_str(&field.terminator);
            }
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tf::lexing::lex_with;
    use std::collections::HashMap;

    #[test]
    fn test_header_fields() {
        let raw = "<teiHeader><titleStmt><title>Ilias</title>\n<author>Homerus</author></titleStmt>\
                   <publicationStmt><publisher>Perseus</publisher><date>2020</date></publicationStmt>\
                   </teiHeader><text><body><p>title</p></body></text>";
        let items = lex_with(raw, &['-'], &HashMap::new()).items;
        let meta = read_header(&items, &default_header_fields());
        assert_eq!(meta.get("title").map(String::as_str), Some("Ilias"));
        assert_eq!(meta.get("author").map(String::as_str), Some("Homerus"));
        assert_eq!(
            meta.get("publicationStmt").map(String::as_str),
            Some("Perseus, 2020.")
        );
        assert_eq!(meta.len(), 3);
    }

    #[test]
    fn test_terminator_not_doubled() {
        let raw = "<sourceDesc><p>Oxford 1920.</p></sourceDesc><body>";
        let items = lex_with(raw, &[], &HashMap::new()).items;
        let meta = read_header(&items, &default_header_fields());
        assert_eq!(meta["sourceDesc"], "Oxford 1920.");
    }
}
