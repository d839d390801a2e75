//! Attribute schema inference
//!
//!     A static pass over the lexed items of one document decides, for every
//!     attributed tag signature, which attribute carries the node value, which
//!     attributes name the node, and whether the signature is a section level.
//!
//!     Values are collected as sets per key, so cardinality means "distinct
//!     values seen anywhere in the document". The rules:
//!
//!         - no keys: no value key, the tag names the node
//!         - one key: that key is the value key, the tag names the node
//!         - several keys: `n` is the value key when present, otherwise the key
//!           with most distinct values (ties go to declared section keys, then
//!           to the key seen first); declared section keys name the node when
//!           present, otherwise the remaining key with most distinct values
//!
//!     A tie for the naming key is reported and the signature is never a
//!     section. Section levels are listed in order of first appearance.

pub mod signature;

pub use signature::{TagSignature, ValueSets};

use crate::tf::diagnostics::{self, Diagnostic, Location};
use crate::tf::lexing::{Attributes, LexItem};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute holding a section's number.
pub const NUMBER_KEY: &str = "n";

/// Joins several naming values into one level name.
pub const LEVEL_JOINER: &str = "-";

/// Caller-declared key sets steering inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaKeys {
    /// Tag prefixes that may denote sections (`div` also covers `div1`).
    pub section_tags: Vec<String>,
    /// Attributes naming a section level.
    pub section_keys: BTreeSet<String>,
    /// Attributes left out of signatures altogether.
    pub ignore_keys: BTreeSet<String>,
    /// Attributes whose presence rules a signature out as a section.
    pub non_section_keys: BTreeSet<String>,
    /// Level names that are never sections.
    pub non_section_values: BTreeSet<String>,
}

impl SchemaKeys {
    pub fn section_prefix(&self, tag: &str) -> Option<&str> {
        self.section_tags
            .iter()
            .map(String::as_str)
            .find(|prefix| tag.starts_with(prefix))
    }

    fn has_non_section_key<'a>(&self, mut keys: impl Iterator<Item = &'a str>) -> bool {
        keys.any(|k| self.non_section_keys.contains(k))
    }

    /// Signature of one tag occurrence. Section tags are collapsed onto their
    /// declared prefix unless they carry a non-section key.
    pub fn signature(&self, tag: &str, attrs: &Attributes) -> TagSignature {
        let tag = match self.section_prefix(tag) {
            Some(prefix) if !self.has_non_section_key(attrs.keys()) => prefix,
            _ => tag,
        };
        TagSignature::of(tag, attrs, &self.ignore_keys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "keys", rename_all = "snake_case")]
pub enum FeatureKeys {
    /// The tag name itself names the node.
    TagName,
    Attributes(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaEntry {
    pub value_key: Option<String>,
    pub feature_keys: FeatureKeys,
    pub is_section: bool,
    pub ambiguous: bool,
}

impl SchemaEntry {
    fn plain(value_key: Option<String>) -> Self {
        Self {
            value_key,
            feature_keys: FeatureKeys::TagName,
            is_section: false,
            ambiguous: false,
        }
    }

    /// The node's value in one occurrence.
    pub fn value<'a>(&self, attrs: &'a Attributes) -> Option<&'a str> {
        self.value_key.as_deref().and_then(|key| attrs.get(key))
    }

    /// The feature (or level) name of one occurrence of `tag`.
    pub fn feature_name(&self, tag: &str, attrs: &Attributes) -> String {
        match &self.feature_keys {
            FeatureKeys::TagName => tag.to_string(),
            FeatureKeys::Attributes(keys) => {
                let parts: Vec<&str> = keys.iter().filter_map(|k| attrs.get(k)).collect();
                if parts.is_empty() {
                    tag.to_string()
                } else {
                    parts.join(LEVEL_JOINER)
                }
            }
        }
    }
}

/// Inferred schema of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    #[serde(serialize_with = "entries_as_list")]
    pub entries: BTreeMap<TagSignature, SchemaEntry>,
    /// Section level names, outermost (first seen) first.
    pub levels: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

fn entries_as_list<S: Serializer>(
    entries: &BTreeMap<TagSignature, SchemaEntry>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Row<'a> {
        signature: &'a TagSignature,
        #[serde(flatten)]
        entry: &'a SchemaEntry,
    }
    let mut seq = serializer.serialize_seq(Some(entries.len()))?;
    for (signature, entry) in entries {
        seq.serialize_element(&Row { signature, entry })?;
    }
    seq.end()
}

impl Schema {
    pub fn get(&self, signature: &TagSignature) -> Option<&SchemaEntry> {
        self.entries.get(signature)
    }

    pub fn lookup(&self, keys: &SchemaKeys, tag: &str, attrs: &Attributes) -> Option<&SchemaEntry> {
        self.get(&keys.signature(tag, attrs))
    }

    pub fn is_level(&self, name: &str) -> bool {
        self.levels.iter().any(|l| l == name)
    }

    /// Position of `name` in the hierarchy, 0 = outermost.
    pub fn depth(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == name)
    }
}

/// Picks the key with most distinct values; ties go to `preferred` keys,
/// then to the key seen first.
fn widest<'a>(candidates: &[&'a str], sets: &ValueSets, preferred: &BTreeSet<String>) -> Option<&'a str> {
    let mut best: Option<(&str, (usize, bool))> = None;
    for &key in candidates {
        let rank = (sets.cardinality(key), preferred.contains(key));
        if best.map_or(true, |(_, top)| rank > top) {
            best = Some((key, rank));
        }
    }
    best.map(|(key, _)| key)
}

fn resolve(signature: &TagSignature, sets: &ValueSets, keys: &SchemaKeys) -> SchemaEntry {
    let candidate = keys.section_prefix(&signature.tag).is_some()
        && !keys.has_non_section_key(signature.keys.iter().map(String::as_str));
    let numbered = signature.has_key(NUMBER_KEY);

    match signature.keys.as_slice() {
        [] => SchemaEntry::plain(None),
        [only] => SchemaEntry {
            is_section: candidate && numbered && !keys.non_section_values.contains(&signature.tag),
            ..SchemaEntry::plain(Some(only.clone()))
        },
        _ => {
            let ordered: Vec<&str> = sets.keys().filter(|k| signature.has_key(k)).collect();
            let value_key = if numbered {
                Some(NUMBER_KEY)
            } else {
                widest(&ordered, sets, &keys.section_keys)
            };

            let declared: Vec<String> = signature
                .keys
                .iter()
                .filter(|k| keys.section_keys.contains(*k) && Some(k.as_str()) != value_key)
                .cloned()
                .collect();
            let mut ambiguous = false;
            let feature_keys = if !declared.is_empty() {
                FeatureKeys::Attributes(declared)
            } else {
                let rest: Vec<&str> = ordered
                    .iter()
                    .copied()
                    .filter(|k| Some(*k) != value_key && !keys.non_section_keys.contains(*k))
                    .collect();
                match widest(&rest, sets, &BTreeSet::new()) {
                    None => FeatureKeys::TagName,
                    Some(top) => {
                        let width = sets.cardinality(top);
                        ambiguous = rest.iter().filter(|k| sets.cardinality(k) == width).count() > 1;
                        FeatureKeys::Attributes(vec![top.to_string()])
                    }
                }
            };

            let names_section_value = match &feature_keys {
                FeatureKeys::TagName => keys.non_section_values.contains(&signature.tag),
                FeatureKeys::Attributes(fks) => fks
                    .iter()
                    .flat_map(|k| sets.values(k))
                    .any(|v| keys.non_section_values.contains(v)),
            };
            SchemaEntry {
                value_key: value_key.map(str::to_string),
                feature_keys,
                is_section: candidate && numbered && !ambiguous && !names_section_value,
                ambiguous,
            }
        }
    }
}

pub fn infer(items: &[LexItem], keys: &SchemaKeys) -> Schema {
    let mut order: Vec<TagSignature> = Vec::new();
    let mut sets: HashMap<TagSignature, ValueSets> = HashMap::new();
    let mut first_item: HashMap<TagSignature, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        if let LexItem::AttributedTag { name, attrs, .. } = item {
            let signature = keys.signature(name, attrs);
            if !sets.contains_key(&signature) {
                order.push(signature.clone());
                first_item.insert(signature.clone(), index);
            }
            let values = sets.entry(signature).or_default();
            for (key, value) in attrs.iter() {
                if !keys.ignore_keys.contains(key) {
                    values.record(key, value);
                }
            }
        }
    }

    let mut schema = Schema::default();
    for signature in order {
        let values = sets.get(&signature).cloned().unwrap_or_default();
        let entry = resolve(&signature, &values, keys);
        if entry.ambiguous {
            let message = format!(
                "{}: several attributes tie for the naming key, not treated as a section",
                signature
            );
            tracing::warn!(%signature, "ambiguous schema feature key");
            let mut diagnostic = Diagnostic::warning(message).with_code(diagnostics::SCHEMA_AMBIGUOUS_FEATURE_KEY);
            if let Some(index) = first_item.get(&signature) {
                diagnostic = diagnostic.at(Location::Item(*index));
            }
            schema.diagnostics.push(diagnostic);
        }
        schema.entries.insert(signature, entry);
    }

    for item in items {
        if let LexItem::AttributedTag { name, attrs, .. } = item {
            if let Some(entry) = schema.lookup(keys, name, attrs).filter(|e| e.is_section) {
                let level = entry.feature_name(name, attrs);
                if !schema.is_level(&level) {
                    schema.levels.push(level);
                }
            }
        }
    }
    tracing::debug!(
        signatures = schema.entries.len(),
        levels = ?schema.levels,
        "inferred schema"
    );
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, attrs: &[(&str, &str)]) -> LexItem {
        LexItem::AttributedTag {
            name: name.to_string(),
            attrs: attrs.iter().copied().collect(),
            self_closing: false,
        }
    }

    fn keys() -> SchemaKeys {
        SchemaKeys {
            section_tags: vec!["div".into(), "milestone".into()],
            section_keys: BTreeSet::from(["subtype".to_string()]),
            ignore_keys: BTreeSet::from(["corresp".to_string()]),
            non_section_keys: BTreeSet::from(["xml:lang".to_string()]),
            non_section_values: BTreeSet::from(["page".to_string(), "edition".to_string()]),
        }
    }

    #[test]
    fn test_single_attribute_uses_tag_name() {
        let items = vec![tag("div", &[("n", "1")]), tag("div", &[("n", "2")]), tag("hi", &[("rend", "x")])];
        let schema = infer(&items, &keys());
        let div = schema.get(&TagSignature::new("div", ["n"])).expect("div entry");
        assert_eq!(div.value_key.as_deref(), Some("n"));
        assert_eq!(div.feature_keys, FeatureKeys::TagName);
        assert!(div.is_section);
        let hi = schema.get(&TagSignature::new("hi", ["rend"])).expect("hi entry");
        assert_eq!(hi.feature_keys, FeatureKeys::TagName);
        assert!(!hi.is_section);
        assert_eq!(schema.levels, vec!["div"]);
    }

    #[test]
    fn test_declared_section_key_names_levels() {
        let items = vec![
            tag("div", &[("type", "textpart"), ("subtype", "book"), ("n", "1")]),
            tag("div", &[("type", "textpart"), ("subtype", "chapter"), ("n", "1")]),
            tag("div", &[("type", "textpart"), ("subtype", "chapter"), ("n", "2")]),
        ];
        let schema = infer(&items, &keys());
        let entry = schema
            .get(&TagSignature::new("div", ["n", "subtype", "type"]))
            .expect("entry");
        assert_eq!(entry.value_key.as_deref(), Some("n"));
        assert_eq!(entry.feature_keys, FeatureKeys::Attributes(vec!["subtype".into()]));
        assert!(entry.is_section);
        assert_eq!(schema.levels, vec!["book", "chapter"]);
    }

    #[test]
    fn test_numbered_prefix_tags_collapse() {
        let items = vec![
            tag("div1", &[("n", "1"), ("type", "book")]),
            tag("div2", &[("n", "1"), ("type", "chapter")]),
        ];
        let schema = infer(&items, &keys());
        assert_eq!(schema.entries.len(), 1);
        assert_eq!(schema.levels, vec!["book", "chapter"]);
    }

    #[test]
    fn test_tie_is_reported_and_not_a_section() {
        let items = vec![
            tag("div", &[("n", "1"), ("a", "x"), ("b", "y")]),
            tag("div", &[("n", "2"), ("a", "z"), ("b", "w")]),
        ];
        let schema = infer(&items, &keys());
        let entry = schema.get(&TagSignature::new("div", ["a", "b", "n"])).expect("entry");
        assert!(entry.ambiguous);
        assert!(!entry.is_section);
        assert_eq!(entry.feature_keys, FeatureKeys::Attributes(vec!["a".into()]));
        assert_eq!(schema.diagnostics.len(), 1);
        assert!(schema.diagnostics[0].has_code(diagnostics::SCHEMA_AMBIGUOUS_FEATURE_KEY));
        assert_eq!(schema.diagnostics[0].location, Some(Location::Item(0)));
        assert!(schema.levels.is_empty());
    }

    #[test]
    fn test_denylisted_values_and_keys_block_sections() {
        let items = vec![
            tag("milestone", &[("unit", "page"), ("n", "5")]),
            tag("div", &[("type", "edition"), ("n", "urn"), ("xml:lang", "grc")]),
        ];
        let schema = infer(&items, &keys());
        assert!(schema.entries.values().all(|e| !e.is_section));
        assert!(schema.levels.is_empty());
    }

    #[test]
    fn test_value_key_without_number() {
        let items = vec![
            tag("w", &[("lemma", "a"), ("pos", "n")]),
            tag("w", &[("lemma", "b"), ("pos", "n")]),
        ];
        let schema = infer(&items, &keys());
        let entry = schema.get(&TagSignature::new("w", ["lemma", "pos"])).expect("entry");
        assert_eq!(entry.value_key.as_deref(), Some("lemma"));
        assert_eq!(entry.feature_keys, FeatureKeys::Attributes(vec!["pos".into()]));
        assert!(!entry.ambiguous);
    }

    #[test]
    fn test_ignored_keys_leave_signature() {
        let items = vec![tag("div", &[("n", "1"), ("corresp", "#a")])];
        let schema = infer(&items, &keys());
        assert!(schema.get(&TagSignature::new("div", ["n"])).is_some());
    }
}
