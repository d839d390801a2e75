//! Attribute parsing with quoting repair and value correction
//!
//!     Pairs are read as `key="value"` after collapsing whitespace around `=`.
//!     When text remains that is not a pair, single quotes are rewritten to
//!     double quotes and the split is attempted once more; the repair is
//!     reported. Values are trimmed and then looked up in the per-language
//!     correction table.

use super::entities::decode_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;

static EQUALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*=\s*").unwrap());
static PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([^\s="']+)="([^"]*)""#).unwrap());

/// Attributes in document order. Later duplicates replace earlier values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAttributes {
    pub attrs: Attributes,
    pub quoting_repaired: bool,
    /// (key, original value) of every corrected value.
    pub corrected: Vec<(String, String)>,
    /// Text that could not be read as a pair, if any.
    pub unparsed: Option<String>,
}

fn split_pairs(text: &str) -> (Vec<(String, String)>, String) {
    let pairs = PAIR
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect();
    let rest = PAIR.replace_all(text, "").trim().to_string();
    (pairs, rest)
}

/// Parses the attribute part of a tag, i.e. everything after the tag name
/// and before the closing `>` or `/>`.
pub fn parse_attributes(body: &str, corrections: &HashMap<String, String>) -> ParsedAttributes {
    let normalized = EQUALS.replace_all(body, "=");
    let (mut pairs, mut rest) = split_pairs(&normalized);
    let mut quoting_repaired = false;
    if !rest.is_empty() && normalized.contains('\'') {
        let repaired = normalized.replace('\'', "\"");
        (pairs, rest) = split_pairs(&repaired);
        quoting_repaired = true;
    }

    let mut parsed = ParsedAttributes {
        quoting_repaired,
        unparsed: (!rest.is_empty()).then_some(rest),
        ..Default::default()
    };
    for (key, value) in pairs {
        let value = decode_entities(value.trim());
        match corrections.get(&value) {
            Some(fixed) => {
                parsed.attrs.insert(key.clone(), fixed.clone());
                parsed.corrected.push((key, value));
            }
            None => parsed.attrs.insert(key, value),
        }
    }
    parsed
}
