//! Wordform -> lemma table
//!
//!     Rows come from tab-separated files in one of two layouts:
//!
//!         form<TAB>lemma
//!         form<TAB>alternative<TAB>morphology<TAB>lemma
//!
//!     Empty lines and lines starting with `#` are skipped. Every key is stored
//!     lower-cased in NFD. Besides the forms themselves the table registers their
//!     plain variants, the lemmas as their own forms, and movable-nu and
//!     final-sigma variants not already present.

use crate::tf::normalizing::{nfd, plain_low};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum LemmaTableError {
    Io(std::io::Error),
    MalformedRow { line: usize, columns: usize },
    Json(serde_json::Error),
}

impl fmt::Display for LemmaTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LemmaTableError::Io(err) => write!(f, "cannot read lemma table: {}", err),
            LemmaTableError::MalformedRow { line, columns } => write!(
                f,
                "lemma table line {} has {} columns, expected 2 or 4",
                line, columns
            ),
            LemmaTableError::Json(err) => write!(f, "invalid lemma table JSON: {}", err),
        }
    }
}

impl std::error::Error for LemmaTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LemmaTableError::Io(err) => Some(err),
            LemmaTableError::Json(err) => Some(err),
            LemmaTableError::MalformedRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for LemmaTableError {
    fn from(err: std::io::Error) -> Self {
        LemmaTableError::Io(err)
    }
}

impl From<serde_json::Error> for LemmaTableError {
    fn from(err: serde_json::Error) -> Self {
        LemmaTableError::Json(err)
    }
}

/// One source row: a form, an optional alternative spelling and its lemma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaEntry {
    pub form: String,
    pub alternative: Option<String>,
    pub lemma: String,
}

impl LemmaEntry {
    pub fn new(form: impl Into<String>, lemma: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            alternative: None,
            lemma: lemma.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaTable {
    forms: BTreeMap<String, BTreeSet<String>>,
}

fn key(form: &str) -> String {
    nfd(&form.to_lowercase())
}

impl LemmaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Maps exactly `form` to `lemma`, adding to any lemmas already present.
    pub fn insert(&mut self, form: &str, lemma: &str) {
        let form = key(form);
        if form.is_empty() {
            return;
        }
        self.forms.entry(form).or_default().insert(nfd(&lemma.to_lowercase()));
    }

    pub fn get(&self, form: &str) -> Option<&BTreeSet<String>> {
        self.forms.get(form)
    }

    pub fn contains(&self, form: &str) -> bool {
        self.forms.contains_key(form)
    }

    pub fn forms(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = LemmaEntry>) -> Self {
        let mut table = Self::new();
        let entries: Vec<LemmaEntry> = entries.into_iter().collect();
        for entry in &entries {
            table.insert(&entry.form, &entry.lemma);
            table.insert(&plain_low(&entry.form), &entry.lemma);
            if let Some(alternative) = &entry.alternative {
                table.insert(alternative, &entry.lemma);
                table.insert(&plain_low(alternative), &entry.lemma);
            }
        }
        for entry in &entries {
            if !table.contains(&key(&entry.lemma)) {
                table.insert(&entry.lemma, &entry.lemma);
            }
        }
        table.add_variants();
        table
    }

    /// Adds forms without a movable nu and with a corrected final sigma.
    fn add_variants(&mut self) {
        let mut extra: Vec<(String, BTreeSet<String>)> = Vec::new();
        for (form, lemmas) in &self.forms {
            let plain = plain_low(form);
            let movable = plain.chars().count() > 2
                && ["εν", "σιν", "στιν"].iter().any(|end| plain.ends_with(end));
            if movable {
                if let Some(stem) = form.strip_suffix('ν') {
                    extra.push((stem.to_string(), lemmas.clone()));
                }
            } else if let Some(stem) = form.strip_suffix('σ') {
                extra.push((format!("{stem}ς"), lemmas.clone()));
            }
        }
        for (form, lemmas) in extra {
            self.forms.entry(form).or_insert(lemmas);
        }
    }

    pub fn from_tsv(source: &str) -> Result<Self, LemmaTableError> {
        let mut entries = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
            let entry = match columns.as_slice() {
                [form, lemma] => LemmaEntry::new(*form, *lemma),
                [form, alternative, _morphology, lemma] => LemmaEntry {
                    form: form.to_string(),
                    alternative: (!alternative.is_empty()).then(|| alternative.to_string()),
                    lemma: lemma.to_string(),
                },
                _ => {
                    return Err(LemmaTableError::MalformedRow {
                        line: index + 1,
                        columns: columns.len(),
                    })
                }
            };
            entries.push(entry);
        }
        Ok(Self::from_entries(entries))
    }

    /// Loads a table from a `.json` dump or a tab-separated source.
    pub fn load(path: &Path) -> Result<Self, LemmaTableError> {
        let source = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&source)?)
        } else {
            Self::from_tsv(&source)
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<(), LemmaTableError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_and_four_column_rows() {
        let table = LemmaTable::from_tsv("λόγος\tλόγος\n# comment\n\nἀνδρός\tἀνδρος\tn-s---mg-\tἀνήρ\n")
            .expect("parses");
        assert_eq!(
            table.get(&nfd("ἀνδρός")),
            Some(&BTreeSet::from([nfd("ἀνήρ")]))
        );
        assert!(table.contains("ανδρος"));
        assert!(table.contains(&nfd("ἀνήρ")));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = LemmaTable::from_tsv("a\tb\nc\td\te\n").unwrap_err();
        assert_eq!(err.to_string(), "lemma table line 2 has 3 columns, expected 2 or 4");
    }

    #[test]
    fn test_movable_nu_and_sigma_variants() {
        let table = LemmaTable::from_entries([
            LemmaEntry::new("ἐστίν", "εἰμί"),
            LemmaEntry::new("λόγοσ", "λόγος"),
        ]);
        assert!(table.contains(&nfd("ἐστί")));
        assert!(table.contains(&nfd("λόγος")));
    }

    #[test]
    fn test_two_letter_forms_keep_their_nu() {
        let table = LemmaTable::from_entries([LemmaEntry::new("ἐν", "ἐν")]);
        assert!(table.contains(&nfd("ἐν")));
        assert!(!table.contains(&nfd("ἐ")));
        assert!(!table.contains("ε"));
    }

    #[test]
    fn test_lemmas_are_stored_lower_case() {
        let table = LemmaTable::from_entries([LemmaEntry::new("Θεός", "Θεός")]);
        assert_eq!(table.get(&nfd("θεός")), Some(&BTreeSet::from([nfd("θεός")])));
        assert_eq!(table.get("θεος"), Some(&BTreeSet::from([nfd("θεός")])));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let table = LemmaTable::from_entries([LemmaEntry::new("καί", "καί")]);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lemmas.json");
        table.save_json(&path).expect("saves");
        assert_eq!(LemmaTable::load(&path).expect("loads"), table);
    }
}
