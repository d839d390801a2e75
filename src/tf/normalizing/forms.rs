//! Unicode forms and the text formats rendered for every slot

use super::accents::normalize_accents;
use super::betacode::to_betacode;
use crate::tf::segmenting::is_letter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Separator for ambiguity sets inside one feature value.
pub const LIST_SEPARATOR: char = ',';

/// Unicode normalization form used for emitted features.
///
/// All rewriting happens on NFD text; the configured form is applied once,
/// when a feature value leaves the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnicodeForm {
    #[default]
    Nfd,
    Nfc,
}

impl UnicodeForm {
    pub fn apply(&self, text: &str) -> String {
        match self {
            UnicodeForm::Nfd => text.nfd().collect(),
            UnicodeForm::Nfc => text.nfc().collect(),
        }
    }
}

pub fn nfd(text: &str) -> String {
    text.nfd().collect()
}

/// Letters only, lower-cased, diacritics and punctuation removed.
pub fn plain_low(text: &str) -> String {
    text.nfd().filter(|c| is_letter(*c)).flat_map(char::to_lowercase).collect()
}

/// Letters only, upper-cased, diacritics and punctuation removed.
pub fn plain_caps(text: &str) -> String {
    text.nfd().filter(|c| is_letter(*c)).flat_map(char::to_uppercase).collect()
}

/// True when the word carries no diacritics and no capitals.
pub fn is_unaccented(word: &str) -> bool {
    nfd(word) == plain_low(word)
}

/// Applies `f` to every member of a comma-joined set and joins the distinct
/// results in sorted order.
pub fn comma_set(word: &str, f: impl Fn(&str) -> String) -> String {
    word.split(LIST_SEPARATOR)
        .map(f)
        .filter(|w| !w.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}

pub fn main_form(core: &str) -> String {
    comma_set(core, |w| nfd(&w.to_lowercase()))
}

pub fn plain_form(core: &str) -> String {
    comma_set(core, plain_low)
}

/// Plain form without the letters that vary most between editions.
pub fn clean_plain_form(core: &str) -> String {
    plain_form(core)
        .chars()
        .filter(|c| !matches!(c, 'ι' | 'ν' | 'σ' | 'ς'))
        .collect()
}

/// A surface representation emitted as a slot feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Orig,
    Main,
    Norm,
    Plain,
    BetaPlain,
    Lemma,
    CleanPlain,
}

impl TextFormat {
    /// The slot feature holding this format.
    pub fn feature(&self) -> &'static str {
        match self {
            TextFormat::Orig => "orig",
            TextFormat::Main => "main",
            TextFormat::Norm => "norm",
            TextFormat::Plain => "plain",
            TextFormat::BetaPlain => "beta_plain",
            TextFormat::Lemma => "lemma",
            TextFormat::CleanPlain => "clean_plain",
        }
    }

    pub fn otext_name(&self) -> &'static str {
        match self {
            TextFormat::Orig => "fmt:text-orig-full",
            TextFormat::Main => "fmt:text-orig-main",
            TextFormat::Norm => "fmt:text-orig-norm",
            TextFormat::Plain => "fmt:text-orig-plain",
            TextFormat::BetaPlain => "fmt:text-orig-beta_plain",
            TextFormat::Lemma => "fmt:text-orig-lemma",
            TextFormat::CleanPlain => "fmt:text-orig-clean_plain",
        }
    }

    /// Rendering template over slot features.
    pub fn template(&self) -> String {
        match self {
            TextFormat::Orig => "{pre}{orig}{post}".to_string(),
            other => format!("{{{}}} ", other.feature()),
        }
    }

    /// Renders this format from a normalized core. Lemmas are not derived
    /// from the core and yield `None`.
    pub fn render(&self, core: &str) -> Option<String> {
        let rendered = match self {
            TextFormat::Orig => core.to_string(),
            TextFormat::Main => main_form(core),
            TextFormat::Norm => comma_set(core, |w| normalize_accents(&w.to_lowercase())),
            TextFormat::Plain => plain_form(core),
            TextFormat::BetaPlain => comma_set(core, |w| to_betacode(&plain_low(w))),
            TextFormat::CleanPlain => clean_plain_form(core),
            TextFormat::Lemma => return None,
        };
        Some(rendered)
    }

    pub fn description(&self) -> &'static str {
        match self {
            TextFormat::Orig => "original format of the word including punctuation",
            TextFormat::Main => "normalized format of the word excluding punctuation",
            TextFormat::Norm => "accent-normalized format of the word excluding punctuation",
            TextFormat::Plain => "plain format in lowercase",
            TextFormat::BetaPlain => "plain format in lowercase betacode",
            TextFormat::Lemma => "possible lemmata of the original words",
            TextFormat::CleanPlain => "plain format without iota, nu and sigma",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_low_drops_marks_and_punctuation() {
        assert_eq!(plain_low("Ἀνήρ."), "ανηρ");
        assert_eq!(plain_low("..."), "");
        assert_eq!(plain_caps("λόγος"), "ΛΟΓΟΣ");
    }

    #[test]
    fn test_is_unaccented() {
        assert!(is_unaccented("λογος"));
        assert!(!is_unaccented("λόγος"));
        assert!(!is_unaccented("Λογος"));
    }

    #[test]
    fn test_comma_set_sorts_and_dedups() {
        assert_eq!(comma_set("b,a,b", |w| w.to_string()), "a,b");
        assert_eq!(plain_form("λόγος,λογός"), "λογος");
    }

    #[test]
    fn test_clean_plain_form() {
        assert_eq!(clean_plain_form("ἐστίν"), "ετ");
    }

    #[test]
    fn test_templates() {
        assert_eq!(TextFormat::Orig.template(), "{pre}{orig}{post}");
        assert_eq!(TextFormat::BetaPlain.template(), "{beta_plain} ");
        assert_eq!(TextFormat::Main.otext_name(), "fmt:text-orig-main");
    }

    #[test]
    fn test_render_formats() {
        let core = nfd("Λόγος");
        assert_eq!(TextFormat::Orig.render(&core), Some(core.clone()));
        assert_eq!(TextFormat::Main.render(&core), Some(nfd("λόγος")));
        assert_eq!(TextFormat::Plain.render(&core), Some("λογος".to_string()));
        assert_eq!(TextFormat::BetaPlain.render(&core), Some("logos".to_string()));
        assert_eq!(TextFormat::Norm.render(&nfd("καὶ")), Some(nfd("καί")));
        assert_eq!(TextFormat::Lemma.render(&core), None);
    }

    #[test]
    fn test_forms_apply() {
        let composed = "ά";
        assert_eq!(UnicodeForm::Nfd.apply(composed).chars().count(), 2);
        assert_eq!(UnicodeForm::Nfc.apply(&nfd(composed)), composed);
    }
}
