//! Per-language configuration
//!
//!     A [`LanguageConfig`] is one explicit record holding everything that
//!     varies between languages: tokenizer policy, text formats, delimiters,
//!     schema key sets, header fields and the rewrite tables. Presets are
//!     built by composition: [`LanguageConfig::generic`] is the base, the
//!     Greek and Latin presets apply a [`LanguageOverrides`] on top of it,
//!     and user settings can apply one more.
//!
//!     Behaviour is dispatched on the closed [`Language`] variant. `Custom`
//!     carries plain function pointers for embedders.

use crate::tf::lemmatizing::{self, LemmaTable};
use crate::tf::metadata::{default_header_fields, HeaderField};
use crate::tf::normalizing::betacode::transliterate_text;
use crate::tf::normalizing::rules::{attribute_errors, RuleTables, RulesError};
use crate::tf::normalizing::{TextFormat, UnicodeForm};
use crate::tf::schema::SchemaKeys;
use crate::tf::segmenting::{segment, SegmentMode, Token};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

pub type TokenizeFn = fn(&str, &SegmentMode) -> Vec<Token>;
pub type NormalizeFn = fn(&Token) -> Vec<Token>;
pub type LemmatizeFn = fn(&str) -> String;

#[derive(Clone, Copy)]
pub struct CustomHooks {
    pub tokenize: TokenizeFn,
    pub normalize: NormalizeFn,
    pub lemmatize: Option<LemmatizeFn>,
}

impl fmt::Debug for CustomHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHooks")
            .field("lemmatize", &self.lemmatize.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for CustomHooks {
    fn default() -> Self {
        Self {
            tokenize: segment,
            normalize: |token| vec![token.clone()],
            lemmatize: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Language {
    Generic,
    Greek,
    Latin,
    Custom(CustomHooks),
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::Generic => "generic",
            Language::Greek => "greek",
            Language::Latin => "latin",
            Language::Custom(_) => "custom",
        }
    }
}

/// Named replacements applied on top of a base configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LanguageOverrides {
    pub unicode_form: Option<UnicodeForm>,
    pub glue: Option<bool>,
    pub splitters: Option<Vec<char>>,
    pub non_splitters: Option<Vec<char>>,
    pub text_formats: Option<Vec<TextFormat>>,
    pub sentence_delimiters: Option<Vec<char>>,
    pub phrase_delimiters: Option<Vec<char>>,
    pub section_tags: Option<Vec<String>>,
    pub section_keys: Option<Vec<String>>,
    pub ignore_keys: Option<Vec<String>>,
    pub non_section_keys: Option<Vec<String>>,
    pub non_section_values: Option<Vec<String>>,
    pub non_text_tags: Option<Vec<String>>,
    pub feature_attribs: Option<Vec<String>>,
}

fn strings<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct LanguageConfig {
    pub language: Language,
    pub unicode_form: UnicodeForm,
    pub segment_mode: SegmentMode,
    pub text_formats: Vec<TextFormat>,
    pub sentence_delimiters: BTreeSet<char>,
    pub phrase_delimiters: BTreeSet<char>,
    pub schema_keys: SchemaKeys,
    /// Tags whose text becomes a feature value instead of slots.
    pub non_text_tags: BTreeSet<String>,
    /// Attributes whose values open their own feature nodes.
    pub feature_attribs: BTreeSet<String>,
    pub header_fields: Vec<HeaderField>,
    pub attribute_errors: Arc<HashMap<String, String>>,
    pub rules: Arc<RuleTables>,
    pub supply_accents: bool,
    pub document_level: String,
    pub slot_type: String,
    pub sentence_level: String,
    pub phrase_level: String,
}

impl LanguageConfig {
    pub fn generic() -> Self {
        Self {
            language: Language::Generic,
            unicode_form: UnicodeForm::Nfd,
            segment_mode: SegmentMode::split(),
            text_formats: vec![TextFormat::Orig, TextFormat::Main, TextFormat::Plain],
            sentence_delimiters: BTreeSet::from(['.', '?', '!']),
            phrase_delimiters: BTreeSet::from([',', ';', ':']),
            schema_keys: SchemaKeys {
                section_tags: vec!["div".to_string()],
                section_keys: strings(["subtype"]),
                ..SchemaKeys::default()
            },
            non_text_tags: BTreeSet::new(),
            feature_attribs: strings(["corresp", "source"]),
            header_fields: default_header_fields(),
            attribute_errors: Arc::new(HashMap::new()),
            rules: Arc::new(RuleTables::empty()),
            supply_accents: false,
            document_level: "_book".to_string(),
            slot_type: "word".to_string(),
            sentence_level: "_sentence".to_string(),
            phrase_level: "_phrase".to_string(),
        }
    }

    pub fn greek() -> Result<Self, RulesError> {
        let overrides = LanguageOverrides {
            text_formats: Some(vec![
                TextFormat::Orig,
                TextFormat::Main,
                TextFormat::Norm,
                TextFormat::Plain,
                TextFormat::BetaPlain,
                TextFormat::Lemma,
            ]),
            sentence_delimiters: Some(vec!['.', ';']),
            phrase_delimiters: Some(vec![',', '\u{00B7}', '\u{0387}', ':']),
            section_tags: Some(vec!["div".into(), "milestone".into(), "state".into()]),
            ignore_keys: Some(
                ["corresp", "merge", "resp", "id", "xml:id", "source"]
                    .map(String::from)
                    .to_vec(),
            ),
            non_section_keys: Some(
                [
                    "altpage", "altpage1", "altnumbering", "altref", "mspage", "xml:lang", "corresp",
                    "xml:id", "ed", "id", "source",
                ]
                .map(String::from)
                .to_vec(),
            ),
            non_section_values: Some(
                [
                    "altpage", "altpage1", "altnumbering", "altref", "mspage", "xml:lang", "edition",
                    "mignepage", "stephnumbering", "vignumbering", "ms", "textpart", "altedition",
                    "page", "line", "Line", "bekker page", "tlnum", "stephpage", "olpage",
                    "altchapter", "lnum", "bekker line", "altsection", "section2", "casaubonpage",
                    "lineno", "altline", "alt",
                ]
                .map(String::from)
                .to_vec(),
            ),
            non_text_tags: Some(
                ["head", "note", "title", "bibl", "del", "foreign"]
                    .map(String::from)
                    .to_vec(),
            ),
            ..LanguageOverrides::default()
        };
        let mut config = Self::generic().with_overrides(overrides);
        config.language = Language::Greek;
        config.rules = RuleTables::greek()?;
        config.attribute_errors = attribute_errors("greek")?;
        config.supply_accents = true;
        Ok(config)
    }

    pub fn latin() -> Result<Self, RulesError> {
        let mut config = Self::generic();
        config.language = Language::Latin;
        config.attribute_errors = attribute_errors("latin")?;
        Ok(config)
    }

    /// A bare configuration for embedder-supplied behaviour: no schema keys,
    /// no delimiters, the original form only.
    pub fn custom(hooks: CustomHooks) -> Self {
        Self {
            language: Language::Custom(hooks),
            text_formats: vec![TextFormat::Orig],
            sentence_delimiters: BTreeSet::new(),
            phrase_delimiters: BTreeSet::new(),
            schema_keys: SchemaKeys::default(),
            feature_attribs: BTreeSet::new(),
            header_fields: Vec::new(),
            ..Self::generic()
        }
    }

    /// Resolves a preset by name.
    pub fn named(name: &str) -> Result<Option<Self>, RulesError> {
        let config = match name {
            "generic" => Self::generic(),
            "greek" => Self::greek()?,
            "latin" => Self::latin()?,
            "custom" => Self::custom(CustomHooks::default()),
            _ => return Ok(None),
        };
        Ok(Some(config))
    }

    pub fn with_overrides(mut self, o: LanguageOverrides) -> Self {
        let to_set = |v: Vec<String>| v.into_iter().collect::<BTreeSet<_>>();
        if let Some(form) = o.unicode_form {
            self.unicode_form = form;
        }
        if let Some(glue) = o.glue {
            self.segment_mode.glue = glue;
        }
        if let Some(splitters) = o.splitters {
            self.segment_mode.splitters = splitters;
        }
        if let Some(non_splitters) = o.non_splitters {
            self.segment_mode.non_splitters = non_splitters;
        }
        if let Some(formats) = o.text_formats {
            self.text_formats = formats;
        }
        if let Some(delims) = o.sentence_delimiters {
            self.sentence_delimiters = delims.into_iter().collect();
        }
        if let Some(delims) = o.phrase_delimiters {
            self.phrase_delimiters = delims.into_iter().collect();
        }
        if let Some(tags) = o.section_tags {
            self.schema_keys.section_tags = tags;
        }
        if let Some(keys) = o.section_keys {
            self.schema_keys.section_keys = to_set(keys);
        }
        if let Some(keys) = o.ignore_keys {
            self.schema_keys.ignore_keys = to_set(keys);
        }
        if let Some(keys) = o.non_section_keys {
            self.schema_keys.non_section_keys = to_set(keys);
        }
        if let Some(values) = o.non_section_values {
            self.schema_keys.non_section_values = to_set(values);
        }
        if let Some(tags) = o.non_text_tags {
            self.non_text_tags = to_set(tags);
        }
        if let Some(attribs) = o.feature_attribs {
            self.feature_attribs = to_set(attribs);
        }
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        match &self.language {
            Language::Custom(hooks) => (hooks.tokenize)(text, &self.segment_mode),
            Language::Greek => segment(&transliterate_text(text), &self.segment_mode),
            Language::Generic | Language::Latin => segment(text, &self.segment_mode),
        }
    }

    /// Lemma of a normalized word, if this configuration produces lemmas.
    pub fn lemmatize(&self, word: &str, table: Option<&LemmaTable>) -> Option<String> {
        match (&self.language, table) {
            (Language::Custom(CustomHooks { lemmatize: Some(hook), .. }), _) => Some(hook(word)),
            (_, Some(table)) => Some(lemmatizing::lemmatize(word, table)),
            _ => None,
        }
    }

    pub fn is_sentence_end(&self, c: char) -> bool {
        self.sentence_delimiters.contains(&c)
    }

    pub fn is_phrase_end(&self, c: char) -> bool {
        self.phrase_delimiters.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greek_composes_generic() {
        let greek = LanguageConfig::greek().expect("greek preset");
        assert_eq!(greek.language.name(), "greek");
        assert!(greek.is_sentence_end(';'));
        assert!(!greek.is_sentence_end('?'));
        assert!(greek.non_text_tags.contains("note"));
        assert_eq!(greek.schema_keys.section_keys, strings(["subtype"]));
        assert_eq!(greek.header_fields, default_header_fields());
        assert!(!greek.rules.is_empty());
        assert!(greek.supply_accents);
    }

    #[test]
    fn test_overrides_replace_named_fields_only() {
        let config = LanguageConfig::generic().with_overrides(LanguageOverrides {
            sentence_delimiters: Some(vec!['|']),
            glue: Some(true),
            ..Default::default()
        });
        assert_eq!(config.sentence_delimiters, BTreeSet::from(['|']));
        assert!(config.segment_mode.glue);
        assert_eq!(config.phrase_delimiters, BTreeSet::from([',', ';', ':']));
    }

    #[test]
    fn test_greek_tokenizer_transliterates() {
        let greek = LanguageConfig::greek().expect("greek preset");
        let tokens = greek.tokenize("lo/gos.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].post, ".");
    }

    #[test]
    fn test_custom_hooks() {
        fn shout(word: &str) -> String {
            word.to_uppercase()
        }
        let config = LanguageConfig::custom(CustomHooks {
            lemmatize: Some(shout),
            ..CustomHooks::default()
        });
        assert_eq!(config.lemmatize("abc", None), Some("ABC".to_string()));
        assert_eq!(config.tokenize("a b").len(), 2);
    }

    #[test]
    fn test_generic_has_no_lemmas_without_table() {
        assert_eq!(LanguageConfig::generic().lemmatize("abc", None), None);
    }

    #[test]
    fn test_named_presets() {
        assert!(LanguageConfig::named("latin").expect("loads").is_some());
        assert!(LanguageConfig::named("klingon").expect("loads").is_none());
    }
}
