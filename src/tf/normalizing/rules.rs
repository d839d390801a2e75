//! Immutable rewrite tables
//!
//! Tables are parsed from embedded YAML once and shared behind an `Arc`. Every
//! key and value is normalized to NFD on load; tables keyed by the plain form
//! are keyed by [`plain_low`] of the source key.

use super::forms::{nfd, plain_low};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

const GREEK_RULES: &str = include_str!("../../../data/greek.yaml");
const ATTRIBUTE_ERRORS: &str = include_str!("../../../data/attrib_errors.yaml");

/// The canonical elision mark (U+1FBD).
pub const ELISION_MARK: char = '\u{1FBD}';

/// Every codepoint that sources use as an elision mark.
pub const ELISION_SIGNS: [char; 6] = [
    '\u{1FBF}',
    '\u{1FBD}',
    '\'',
    '\u{02BC}',
    '\u{02B9}',
    '\u{2019}',
];

pub fn is_elision_sign(c: char) -> bool {
    ELISION_SIGNS.contains(&c)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesError {
    pub message: String,
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rule table: {}", self.message)
    }
}

impl std::error::Error for RulesError {}

impl From<serde_yaml::Error> for RulesError {
    fn from(err: serde_yaml::Error) -> Self {
        RulesError {
            message: err.to_string(),
        }
    }
}

/// A rewrite of a word's last letters, keyed by its plain form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FinalForm {
    pub plain: String,
    pub strip: usize,
    #[serde(default)]
    pub append: String,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    #[serde(default)]
    elision: BTreeMap<String, String>,
    #[serde(default)]
    crasis: BTreeMap<String, String>,
    #[serde(default)]
    movable_nu: Vec<String>,
    #[serde(default)]
    final_forms: Vec<FinalForm>,
    #[serde(default)]
    nomina_sacra: BTreeMap<String, String>,
}

/// Morphological rewrite tables of one language.
#[derive(Debug, Clone, Default)]
pub struct RuleTables {
    /// Exact elided form -> resolved form.
    pub elision: HashMap<String, String>,
    /// Elision key with the mark kept but diacritics stripped -> comma-joined
    /// resolved forms.
    pub elision_plain: HashMap<String, String>,
    /// Contracted form -> space-separated resolved words.
    pub crasis: HashMap<String, String>,
    /// Plain forms ending in a movable nu.
    pub movable_nu: HashSet<String>,
    pub final_forms: HashMap<String, FinalForm>,
    /// Plain abbreviation -> full form.
    pub nomina_sacra: HashMap<String, String>,
}

/// Plain form of an elision key: diacritics stripped, lower-cased, elision
/// marks kept where they stand.
pub fn elision_key(text: &str) -> String {
    nfd(text)
        .chars()
        .filter_map(|c| {
            if c == ELISION_MARK {
                Some(ELISION_MARK.to_string())
            } else {
                let plain = plain_low(&c.to_string());
                (!plain.is_empty()).then_some(plain)
            }
        })
        .collect()
}

static GREEK_TABLES: Lazy<Result<Arc<RuleTables>, RulesError>> =
    Lazy::new(|| RuleTables::from_yaml(GREEK_RULES).map(Arc::new));

impl RuleTables {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The embedded Greek tables, parsed on first use.
    pub fn greek() -> Result<Arc<RuleTables>, RulesError> {
        (*GREEK_TABLES).clone()
    }

    pub fn from_yaml(source: &str) -> Result<Self, RulesError> {
        let raw: RawRules = serde_yaml::from_str(source)?;

        let elision: HashMap<String, String> = raw
            .elision
            .iter()
            .map(|(k, v)| (nfd(&k.to_lowercase()), nfd(v)))
            .collect();
        let mut grouped: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (key, value) in &elision {
            grouped
                .entry(elision_key(key))
                .or_default()
                .insert(value.clone());
        }
        let elision_plain = grouped
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect::<Vec<_>>().join(",")))
            .collect();

        let mut crasis = HashMap::new();
        for (key, value) in &raw.crasis {
            if value.split(' ').filter(|w| !w.is_empty()).count() < 2 {
                return Err(RulesError {
                    message: format!("crasis entry {:?} does not resolve to several words", key),
                });
            }
            crasis.insert(nfd(&key.to_lowercase()), nfd(value));
        }

        let final_forms = raw
            .final_forms
            .into_iter()
            .map(|f| {
                let plain = plain_low(&f.plain);
                (
                    plain.clone(),
                    FinalForm {
                        plain,
                        strip: f.strip,
                        append: nfd(&f.append),
                    },
                )
            })
            .collect();

        Ok(RuleTables {
            elision,
            elision_plain,
            crasis,
            movable_nu: raw.movable_nu.iter().map(|w| plain_low(w)).collect(),
            final_forms,
            nomina_sacra: raw
                .nomina_sacra
                .iter()
                .map(|(k, v)| (plain_low(k), nfd(v)))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.elision.is_empty()
            && self.crasis.is_empty()
            && self.movable_nu.is_empty()
            && self.final_forms.is_empty()
            && self.nomina_sacra.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawAttributeErrors(BTreeMap<String, BTreeMap<String, String>>);

static ATTRIBUTE_ERROR_TABLES: Lazy<Result<BTreeMap<String, BTreeMap<String, String>>, RulesError>> =
    Lazy::new(|| {
        serde_yaml::from_str::<RawAttributeErrors>(ATTRIBUTE_ERRORS)
            .map(|raw| raw.0)
            .map_err(RulesError::from)
    });

/// Attribute-value corrections for `language`, layered over the generic ones.
pub fn attribute_errors(language: &str) -> Result<Arc<HashMap<String, String>>, RulesError> {
    let tables = (*ATTRIBUTE_ERROR_TABLES).clone()?;
    let mut merged: HashMap<String, String> = HashMap::new();
    for name in ["generic", language] {
        if let Some(table) = tables.get(name) {
            merged.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    Ok(Arc::new(merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_greek_tables_load() {
        let rules = RuleTables::greek().expect("embedded tables parse");
        assert_eq!(rules.crasis.get(&nfd("χὠ")), Some(&nfd("καὶ ὁ")));
        assert_eq!(rules.elision.get(&nfd("δ᾽")), Some(&nfd("δέ")));
        assert!(rules.movable_nu.contains("εστιν"));
        assert_eq!(rules.final_forms["ουκ"].strip, 1);
        assert_eq!(rules.nomina_sacra.get("θς"), Some(&nfd("θεός")));
    }

    #[test]
    fn test_every_crasis_entry_has_several_words() {
        let rules = RuleTables::greek().expect("embedded tables parse");
        for value in rules.crasis.values() {
            assert!(value.split(' ').count() >= 2, "{value}");
        }
    }

    #[test]
    fn test_elision_key_keeps_mark() {
        assert_eq!(elision_key("ἀλλ᾽"), "αλλ\u{1FBD}");
        assert_eq!(elision_key("᾽στί"), "\u{1FBD}στι");
    }

    #[test]
    fn test_plain_collisions_are_joined() {
        let rules = RuleTables::from_yaml("elision:\n  \"ἀφ᾽\": \"ἀπό\"\n  \"ἄφ᾽\": \"ἄφα\"\n")
            .expect("parses");
        assert_eq!(
            rules.elision_plain.get(&elision_key("αφ᾽")),
            Some(&format!("{},{}", nfd("ἄφα"), nfd("ἀπό")))
        );
    }

    #[test]
    fn test_single_word_crasis_is_rejected() {
        let err = RuleTables::from_yaml("crasis:\n  \"κἀγώ\": \"καί\"\n").unwrap_err();
        assert!(err.to_string().contains("κἀγώ"));
    }

    #[test]
    fn test_attribute_errors_layer_generic_table() {
        let greek = attribute_errors("greek").expect("embedded table parses");
        assert_eq!(greek.get("Chapter").map(String::as_str), Some("chapter"));
        assert_eq!(greek.get("Textpart").map(String::as_str), Some("textpart"));
        let generic = attribute_errors("generic").expect("embedded table parses");
        assert!(!generic.contains_key("Textpart"));
    }
}
