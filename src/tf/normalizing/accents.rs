//! Greek syllabification and accent placement
//!
//!     Unaccented words are split into syllables around their vowel nuclei and
//!     every placement the length of the last two syllables allows is generated:
//!     oxytone, perispomenon, paroxytone, properispomenon and proparoxytone.
//!     Vowels of unknown length (alpha, iota, upsilon) admit both readings; a
//!     second pass treats them as short and the two candidate sets are unioned.

use super::forms::{is_unaccented, nfd, LIST_SEPARATOR};
use super::AccentStatus;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

pub const ACUTE: char = '\u{0301}';
pub const GRAVE: char = '\u{0300}';
pub const CIRCUMFLEX: char = '\u{0342}';

const DIPHTHONGS: [[char; 2]; 8] = [
    ['α', 'ι'],
    ['ε', 'ι'],
    ['ο', 'ι'],
    ['υ', 'ι'],
    ['α', 'υ'],
    ['ε', 'υ'],
    ['η', 'υ'],
    ['ο', 'υ'],
];

/// Consonant clusters that may open a syllable.
const ONSETS: &[&str] = &[
    "βλ", "βρ", "γλ", "γν", "γρ", "δμ", "δρ", "θλ", "θν", "θρ", "κλ", "κμ", "κν", "κρ", "κτ", "μν",
    "πλ", "πν", "πρ", "πτ", "σβ", "σθ", "σκ", "σμ", "σπ", "στ", "σφ", "σχ", "τλ", "τμ", "τρ", "φθ",
    "φλ", "φρ", "χθ", "χλ", "χν", "χρ", "σκλ", "σκρ", "σπλ", "σπρ", "στρ", "φθρ",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyllabifyError {
    NotGreek(char),
    NoVowel,
}

impl fmt::Display for SyllabifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyllabifyError::NotGreek(c) => write!(f, "not a plain Greek letter: {:?}", c),
            SyllabifyError::NoVowel => write!(f, "word has no vowel"),
        }
    }
}

impl std::error::Error for SyllabifyError {}

fn is_vowel(c: char) -> bool {
    matches!(c, 'α' | 'ε' | 'η' | 'ι' | 'ο' | 'υ' | 'ω')
}

fn is_consonant(c: char) -> bool {
    matches!(
        c,
        'β' | 'γ'
            | 'δ'
            | 'ζ'
            | 'θ'
            | 'κ'
            | 'λ'
            | 'μ'
            | 'ν'
            | 'ξ'
            | 'π'
            | 'ρ'
            | 'σ'
            | 'ς'
            | 'τ'
            | 'φ'
            | 'χ'
            | 'ψ'
            | 'ϝ'
    )
}

/// One syllable of a plain word, with the position of its vowel nucleus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    letters: Vec<char>,
    nucleus: Range<usize>,
}

impl Syllable {
    pub fn text(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn nucleus(&self) -> &[char] {
        &self.letters[self.nucleus.clone()]
    }

    fn ends_in_nucleus(&self) -> bool {
        self.nucleus.end == self.letters.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Length {
    Short,
    Long,
    Unknown,
}

fn length(syllable: &Syllable, is_ultima: bool) -> Length {
    match syllable.nucleus() {
        ['α', 'ι'] | ['ο', 'ι'] if is_ultima && syllable.ends_in_nucleus() => Length::Short,
        [_, _] => Length::Long,
        ['η'] | ['ω'] => Length::Long,
        ['ε'] | ['ο'] => Length::Short,
        _ => Length::Unknown,
    }
}

/// Accent placements, named by position and accent kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accentuation {
    Oxytone,
    Perispomenon,
    Paroxytone,
    Properispomenon,
    Proparoxytone,
}

impl Accentuation {
    /// Syllable position counted from the end, 1 = ultima.
    fn position(&self) -> usize {
        match self {
            Accentuation::Oxytone | Accentuation::Perispomenon => 1,
            Accentuation::Paroxytone | Accentuation::Properispomenon => 2,
            Accentuation::Proparoxytone => 3,
        }
    }

    fn mark(&self) -> char {
        match self {
            Accentuation::Perispomenon | Accentuation::Properispomenon => CIRCUMFLEX,
            _ => ACUTE,
        }
    }
}

pub fn syllabify(word: &str) -> Result<Vec<Syllable>, SyllabifyError> {
    let letters: Vec<char> = word.chars().collect();
    if let Some(c) = letters.iter().find(|c| !is_vowel(**c) && !is_consonant(**c)) {
        return Err(SyllabifyError::NotGreek(*c));
    }

    let mut nuclei: Vec<Range<usize>> = Vec::new();
    let mut i = 0;
    while i < letters.len() {
        if !is_vowel(letters[i]) {
            i += 1;
            continue;
        }
        let width = match letters.get(i + 1) {
            Some(next) if DIPHTHONGS.contains(&[letters[i], *next]) => 2,
            _ => 1,
        };
        nuclei.push(i..i + width);
        i += width;
    }
    if nuclei.is_empty() {
        return Err(SyllabifyError::NoVowel);
    }

    let mut starts = vec![0];
    for pair in nuclei.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let cluster = &letters[left.end..right.start];
        let cut = match cluster.len() {
            0 => right.start,
            1 => left.end,
            _ => {
                let whole: String = cluster.iter().collect();
                let tail: String = cluster[1..].iter().collect();
                if ONSETS.contains(&whole.as_str()) {
                    left.end
                } else if cluster.len() > 2 && ONSETS.contains(&tail.as_str()) {
                    left.end + 1
                } else {
                    right.start - 1
                }
            }
        };
        starts.push(cut);
    }

    let syllables = nuclei
        .iter()
        .enumerate()
        .map(|(k, nucleus)| {
            let start = starts[k];
            let end = starts.get(k + 1).copied().unwrap_or(letters.len());
            Syllable {
                letters: letters[start..end].to_vec(),
                nucleus: nucleus.start - start..nucleus.end - start,
            }
        })
        .collect();
    Ok(syllables)
}

/// Placements allowed by the syllable lengths. With `default_short`, vowels of
/// unknown length count as short.
pub fn possible_accentuations(syllables: &[Syllable], default_short: bool) -> Vec<Accentuation> {
    let resolve = |length: Length| match length {
        Length::Unknown if default_short => Length::Short,
        other => other,
    };
    let count = syllables.len();
    let Some(last) = syllables.last() else {
        return Vec::new();
    };
    let ultima = resolve(length(last, true));
    let penult = if count >= 2 {
        resolve(length(&syllables[count - 2], false))
    } else {
        Length::Unknown
    };

    let mut out = vec![Accentuation::Oxytone];
    if ultima != Length::Short {
        out.push(Accentuation::Perispomenon);
    }
    if count >= 2 && !(penult == Length::Long && ultima == Length::Short) {
        out.push(Accentuation::Paroxytone);
    }
    if count >= 2 && penult != Length::Short && ultima != Length::Long {
        out.push(Accentuation::Properispomenon);
    }
    if count >= 3 && ultima != Length::Long {
        out.push(Accentuation::Proparoxytone);
    }
    out
}

/// Writes the accent on the last vowel of the chosen syllable's nucleus.
pub fn add_accent(syllables: &[Syllable], accentuation: Accentuation) -> String {
    let target = syllables.len().saturating_sub(accentuation.position());
    let mut out = String::new();
    for (k, syllable) in syllables.iter().enumerate() {
        for (i, c) in syllable.letters.iter().enumerate() {
            out.push(*c);
            if k == target && i + 1 == syllable.nucleus.end {
                out.push(accentuation.mark());
            }
        }
    }
    nfd(&out)
}

/// Replaces an unaccented word by the set of its possible accentuations.
///
/// Words that already carry diacritics come back untouched with
/// [`AccentStatus::NotNeeded`]; words that cannot be syllabified come back
/// untouched with [`AccentStatus::Skipped`].
pub fn reconstruct(word: &str) -> (String, AccentStatus) {
    if word.is_empty() || word.contains(LIST_SEPARATOR) || !is_unaccented(word) {
        return (word.to_string(), AccentStatus::NotNeeded);
    }
    let syllables = match syllabify(word) {
        Ok(syllables) => syllables,
        Err(err) => {
            tracing::debug!(word, %err, "accent reconstruction skipped");
            return (word.to_string(), AccentStatus::Skipped);
        }
    };
    let candidates: BTreeSet<String> = [false, true]
        .into_iter()
        .flat_map(|short| possible_accentuations(&syllables, short))
        .map(|accentuation| add_accent(&syllables, accentuation))
        .collect();
    let joined = candidates.into_iter().collect::<Vec<_>>().join(",");
    (joined, AccentStatus::Reconstructed)
}

/// Grave becomes acute and any accent after the first one is dropped.
pub fn normalize_accents(word: &str) -> String {
    let mut seen_accent = false;
    let mut out = String::new();
    for c in nfd(word).chars() {
        let c = if c == GRAVE { ACUTE } else { c };
        if c == ACUTE || c == CIRCUMFLEX {
            if seen_accent {
                continue;
            }
            seen_accent = true;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(word: &str) -> Vec<String> {
        syllabify(word)
            .expect("syllabifies")
            .iter()
            .map(Syllable::text)
            .collect()
    }

    #[test]
    fn test_syllabify_simple_and_clusters() {
        assert_eq!(texts("λογος"), vec!["λο", "γος"]);
        assert_eq!(texts("ανθρωπος"), vec!["αν", "θρω", "πος"]);
        assert_eq!(texts("εστιν"), vec!["ε", "στιν"]);
        assert_eq!(texts("παυω"), vec!["παυ", "ω"]);
    }

    #[test]
    fn test_syllabify_errors() {
        assert_eq!(syllabify("λγ"), Err(SyllabifyError::NoVowel));
        assert_eq!(syllabify("abc"), Err(SyllabifyError::NotGreek('a')));
    }

    #[test]
    fn test_reconstruct_short_penult() {
        let (word, status) = reconstruct("λογος");
        assert_eq!(status, AccentStatus::Reconstructed);
        assert_eq!(word, nfd("λόγος,λογός"));
    }

    #[test]
    fn test_reconstruct_long_penult() {
        let (word, _) = reconstruct("ανθρωπος");
        let set: BTreeSet<String> = word.split(',').map(str::to_string).collect();
        let expected: BTreeSet<String> = ["ανθρωπός", "ανθρῶπος", "άνθρωπος"]
            .iter()
            .map(|w| nfd(w))
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_reconstruct_leaves_accented_words() {
        assert_eq!(
            reconstruct("λόγος"),
            ("λόγος".to_string(), AccentStatus::NotNeeded)
        );
    }

    #[test]
    fn test_reconstruct_reports_skip() {
        assert_eq!(
            reconstruct("ββ"),
            ("ββ".to_string(), AccentStatus::Skipped)
        );
    }

    #[test]
    fn test_normalize_accents() {
        assert_eq!(normalize_accents("καὶ"), nfd("καί"));
        assert_eq!(normalize_accents("ἄνθρωπός"), nfd("ἄνθρωπος"));
    }
}
