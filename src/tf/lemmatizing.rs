//! Lemma resolution
//!
//!     Lookup runs a fallback chain, each step tried only when the previous one
//!     missed:
//!
//!         1. the lower-cased NFD form
//!         2. the form with normalized accents (grave to acute, one accent)
//!         3. the plain form
//!
//!     A miss yields `*` followed by the lower-cased form. Comma-joined
//!     ambiguity sets are resolved part by part and the results re-joined as a
//!     sorted set.

pub mod table;

pub use table::{LemmaEntry, LemmaTable, LemmaTableError};

use crate::tf::normalizing::accents::normalize_accents;
use crate::tf::normalizing::forms::LIST_SEPARATOR;
use crate::tf::normalizing::{nfd, plain_low};
use serde::Serialize;
use std::collections::BTreeSet;

/// Prefix marking a form the table does not know.
pub const MISS_MARKER: char = '*';

fn resolve_part<'a>(part: &str, table: &'a LemmaTable) -> Option<&'a BTreeSet<String>> {
    table
        .get(part)
        .or_else(|| table.get(&normalize_accents(part)))
        .or_else(|| table.get(&plain_low(part)))
}

pub fn lemmatize(word: &str, table: &LemmaTable) -> String {
    let word = nfd(&word.to_lowercase());
    let mut lemmas: BTreeSet<String> = BTreeSet::new();
    for part in word.split(LIST_SEPARATOR).filter(|p| !p.is_empty()) {
        match resolve_part(part, table) {
            Some(found) => lemmas.extend(found.iter().cloned()),
            None => {
                lemmas.insert(format!("{MISS_MARKER}{part}"));
            }
        }
    }
    lemmas.into_iter().collect::<Vec<_>>().join(",")
}

pub fn is_miss(lemma: &str) -> bool {
    lemma.starts_with(MISS_MARKER)
}

/// Running count of resolved and unresolved lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LemmaTally {
    pub found: usize,
    pub missed: usize,
}

impl LemmaTally {
    pub fn record(&mut self, lemma: &str) {
        if is_miss(lemma) {
            self.missed += 1;
        } else {
            self.found += 1;
        }
    }

    pub fn merge(&mut self, other: &LemmaTally) {
        self.found += other.found;
        self.missed += other.missed;
    }

    pub fn total(&self) -> usize {
        self.found + self.missed
    }

    /// Share of resolved lookups, 1.0 when nothing was looked up.
    pub fn ratio(&self) -> f64 {
        match self.total() {
            0 => 1.0,
            total => self.found as f64 / total as f64,
        }
    }

    pub fn coverage(&self) -> &'static str {
        match self.ratio() {
            r if r >= 0.95 => "excellent",
            r if r >= 0.80 => "good",
            r if r >= 0.50 => "fair",
            _ => "poor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LemmaTable {
        LemmaTable::from_entries([
            LemmaEntry::new("λόγος", "λόγος"),
            LemmaEntry::new("καί", "καί"),
            LemmaEntry::new("ἀνδρός", "ἀνήρ"),
            LemmaEntry::new("ἄφα", "ἄφα"),
            LemmaEntry::new("ἀπό", "ἀπό"),
        ])
    }

    #[test]
    fn test_exact_lookup_is_case_insensitive() {
        assert_eq!(lemmatize("Καί", &table()), nfd("καί"));
    }

    #[test]
    fn test_grave_falls_back_to_acute() {
        assert_eq!(lemmatize("καὶ", &table()), nfd("καί"));
    }

    #[test]
    fn test_plain_fallback() {
        assert_eq!(lemmatize("ανδρος", &table()), nfd("ἀνήρ"));
    }

    #[test]
    fn test_miss_is_marked() {
        assert_eq!(lemmatize("Ξένος", &table()), format!("*{}", nfd("ξένος")));
        assert!(is_miss(&lemmatize("ξένος", &table())));
    }

    #[test]
    fn test_ambiguity_sets_are_unioned_and_sorted() {
        let word = format!("{},{}", nfd("ἀπό"), nfd("ἄφα"));
        assert_eq!(
            lemmatize(&word, &table()),
            format!("{},{}", nfd("ἄφα"), nfd("ἀπό"))
        );
        let with_miss = format!("{},{}", nfd("ἀπό"), nfd("ξένος"));
        assert_eq!(
            lemmatize(&with_miss, &table()),
            format!("*{},{}", nfd("ξένος"), nfd("ἀπό"))
        );
    }

    #[test]
    fn test_tally_ratio() {
        let mut tally = LemmaTally::default();
        assert_eq!(tally.ratio(), 1.0);
        tally.record("λόγος");
        tally.record("*ξένος");
        assert_eq!(tally, LemmaTally { found: 1, missed: 1 });
        assert_eq!(tally.ratio(), 0.5);
        assert_eq!(tally.coverage(), "fair");
    }
}
