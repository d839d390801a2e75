//! Finished corpus

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Int,
    Str,
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusNode {
    pub id: usize,
    pub level: String,
    /// Linked slot numbers, 1-based.
    pub slots: Vec<usize>,
    pub features: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Corpus {
    pub slot_type: String,
    /// Slot features, slot 1 first.
    pub slots: Vec<BTreeMap<String, String>>,
    pub nodes: Vec<CorpusNode>,
    pub feature_types: BTreeMap<String, FeatureType>,
    pub meta: BTreeMap<String, String>,
}

impl Corpus {
    pub fn new(
        slot_type: String,
        slots: Vec<BTreeMap<String, String>>,
        nodes: Vec<CorpusNode>,
        meta: BTreeMap<String, String>,
    ) -> Self {
        let mut feature_types: BTreeMap<String, FeatureType> = BTreeMap::new();
        let all = slots.iter().chain(nodes.iter().map(|n| &n.features));
        for features in all {
            for (name, value) in features {
                let kind = if is_integer(value) {
                    FeatureType::Int
                } else {
                    FeatureType::Str
                };
                let entry = feature_types.entry(name.clone()).or_insert(kind);
                if kind == FeatureType::Str {
                    *entry = FeatureType::Str;
                }
            }
        }
        Self {
            slot_type,
            slots,
            nodes,
            feature_types,
            meta,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Value of `name` on every slot, empty string where unset.
    pub fn slot_values(&self, name: &str) -> Vec<&str> {
        self.slots
            .iter()
            .map(|s| s.get(name).map(String::as_str).unwrap_or(""))
            .collect()
    }

    pub fn nodes_of<'a>(&'a self, level: &'a str) -> impl Iterator<Item = &'a CorpusNode> {
        self.nodes.iter().filter(move |n| n.level == level)
    }

    /// Node levels in order of first creation.
    pub fn levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if !levels.contains(&node.level.as_str()) {
                levels.push(&node.level);
            }
        }
        levels
    }

    /// Renders the slots with `template`, where `{name}` stands for a slot feature.
    pub fn render(&self, template: &str) -> String {
        self.slots
            .iter()
            .map(|features| {
                let mut out = template.to_string();
                for (name, value) in features {
                    out = out.replace(&format!("{{{}}}", name), value);
                }
                out
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_feature_types() {
        let corpus = Corpus::new(
            "word".into(),
            vec![features(&[("orig", "καί"), ("n", "1")])],
            vec![CorpusNode {
                id: 0,
                level: "div".into(),
                slots: vec![1],
                features: features(&[("div", "1"), ("n", "1a")]),
            }],
            BTreeMap::new(),
        );
        assert_eq!(corpus.feature_types["orig"], FeatureType::Str);
        assert_eq!(corpus.feature_types["div"], FeatureType::Int);
        assert_eq!(corpus.feature_types["n"], FeatureType::Str);
    }

    #[test]
    fn test_render_template() {
        let corpus = Corpus::new(
            "word".into(),
            vec![
                features(&[("pre", ""), ("orig", "καί"), ("post", " ")]),
                features(&[("pre", "«"), ("orig", "ὁ"), ("post", ".")]),
            ],
            Vec::new(),
            BTreeMap::new(),
        );
        assert_eq!(corpus.render("{pre}{orig}{post}"), "καί «ὁ.");
    }
}
