//! Morphological normalization of token triples
//!
//!     The normalizer rewrites one triple into one or more triples. Most words
//!     come back as a single triple; Greek crasis expands a contracted form into
//!     the words it stands for. The rewrite steps run in a fixed order:
//!
//!         1. script repair (betacode, variant letterforms)
//!         2. elision, tried before crasis and exclusive with it
//!         3. crasis
//!         4. per word: movable nu, final letter forms, nomina sacra
//!         5. accent reconstruction for unaccented words
//!
//!     Nothing here fails. Every rewrite that was applied is reported in
//!     [`NormalizedToken::rewrites`] and the outcome of step 5 in
//!     [`NormalizedToken::accent`], so callers can tell a word that needed no
//!     work from one the normalizer gave up on.

pub mod accents;
pub mod betacode;
pub mod forms;
pub mod greek;
pub mod rules;

use crate::tf::language::{Language, LanguageConfig};
use crate::tf::segmenting::{is_word_char, Token};
use serde::Serialize;

pub use forms::{nfd, plain_low, TextFormat, UnicodeForm};
pub use rules::{RuleTables, RulesError};

/// Outcome of accent reconstruction for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentStatus {
    /// The word already carried diacritics, or reconstruction is disabled.
    NotNeeded,
    /// The word was replaced by its candidate accentuations.
    Reconstructed,
    /// The word could not be syllabified and passed through unaccented.
    Skipped,
}

/// A single rewrite applied to a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rewrite {
    Transliterated { from: String },
    ScriptVariant,
    InteriorRemoved { removed: String },
    NuAbbreviation,
    Elision { from: String, to: String },
    Crasis { from: String, to: String },
    MovableNu,
    FinalSigma,
    FinalForm { from: String, to: String },
    NominaSacra { from: String, to: String },
}

impl Rewrite {
    pub fn kind(&self) -> &'static str {
        match self {
            Rewrite::Transliterated { .. } => "transliterated",
            Rewrite::ScriptVariant => "script_variant",
            Rewrite::InteriorRemoved { .. } => "interior_removed",
            Rewrite::NuAbbreviation => "nu_abbreviation",
            Rewrite::Elision { .. } => "elision",
            Rewrite::Crasis { .. } => "crasis",
            Rewrite::MovableNu => "movable_nu",
            Rewrite::FinalSigma => "final_sigma",
            Rewrite::FinalForm { .. } => "final_form",
            Rewrite::NominaSacra { .. } => "nomina_sacra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedToken {
    pub token: Token,
    pub accent: AccentStatus,
    pub rewrites: Vec<Rewrite>,
}

impl NormalizedToken {
    pub fn unchanged(token: Token) -> Self {
        Self {
            token,
            accent: AccentStatus::NotNeeded,
            rewrites: Vec::new(),
        }
    }
}

/// Normalizes one triple under the configured language.
///
/// The result is never empty.
pub fn normalize(token: &Token, config: &LanguageConfig) -> Vec<NormalizedToken> {
    match &config.language {
        Language::Greek => greek::normalize(token, &config.rules, config.supply_accents),
        Language::Generic | Language::Latin => vec![normalize_generic(token)],
        Language::Custom(hooks) => {
            let tokens = (hooks.normalize)(token);
            if tokens.is_empty() {
                vec![NormalizedToken::unchanged(token.clone())]
            } else {
                tokens.into_iter().map(NormalizedToken::unchanged).collect()
            }
        }
    }
}

/// Removes everything from the core that is not a letter or a mark.
pub fn normalize_generic(token: &Token) -> NormalizedToken {
    let core = nfd(&token.core);
    let (kept, removed) = strip_interior(&core, |_| false);
    let mut out = NormalizedToken::unchanged(Token::new(token.pre.clone(), kept, token.post.clone()));
    if !removed.is_empty() {
        out.rewrites.push(Rewrite::InteriorRemoved { removed });
    }
    out
}

/// Splits `word` into the characters it keeps (word characters and those
/// accepted by `keep`) and the ones it drops.
pub(crate) fn strip_interior(word: &str, keep: impl Fn(char) -> bool) -> (String, String) {
    let mut kept = String::with_capacity(word.len());
    let mut removed = String::new();
    for c in word.chars() {
        if is_word_char(c) || keep(c) {
            kept.push(c);
        } else {
            removed.push(c);
        }
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_removes_interior_hyphen() {
        let out = normalize_generic(&Token::new("", "ἀνή-ρ", " "));
        assert_eq!(out.token, Token::new("", nfd("ἀνήρ"), " "));
        assert_eq!(
            out.rewrites,
            vec![Rewrite::InteriorRemoved {
                removed: "-".to_string()
            }]
        );
    }

    #[test]
    fn test_generic_leaves_clean_words_alone() {
        let out = normalize_generic(&Token::new("(", "verbum", ")"));
        assert_eq!(out, NormalizedToken::unchanged(Token::new("(", "verbum", ")")));
    }

    #[test]
    fn test_rewrite_kinds_serialize_tagged() {
        let json = serde_json::to_string(&Rewrite::MovableNu).expect("serializes");
        assert_eq!(json, r#"{"kind":"movable_nu"}"#);
    }
}
