//! Tag signatures and observed attribute values

use crate::tf::lexing::Attributes;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// `(tag, sorted attribute keys)` with ignored keys removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TagSignature {
    pub tag: String,
    pub keys: Vec<String>,
}

impl TagSignature {
    pub fn new(tag: impl Into<String>, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();
        Self {
            tag: tag.into(),
            keys,
        }
    }

    pub fn of(tag: &str, attrs: &Attributes, ignore: &BTreeSet<String>) -> Self {
        Self::new(tag, attrs.keys().filter(|k| !ignore.contains(*k)))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

impl fmt::Display for TagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.keys.join(","))
    }
}

/// Distinct values per attribute key, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSets {
    keys: Vec<(String, Vec<String>)>,
}

impl ValueSets {
    pub fn record(&mut self, key: &str, value: &str) {
        let index = match self.keys.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.keys.push((key.to_string(), Vec::new()));
                self.keys.len() - 1
            }
        };
        let values = &mut self.keys[index].1;
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    pub fn cardinality(&self, key: &str) -> usize {
        self.values(key).len()
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(k, _)| k.as_str())
    }
}
