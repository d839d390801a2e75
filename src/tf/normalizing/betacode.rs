//! Betacode transliteration
//!
//!     Betacode writes Greek in ASCII: letters map one to one, `*` marks a capital
//!     and the diacritics follow the letter (or sit between `*` and a capital).
//!     `s1`, `s2` and `s3` select medial, final and lunate sigma.

use super::forms::nfd;
use once_cell::sync::Lazy;
use regex::Regex;

/// A run of betacode inside running text.
static BETACODE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\*[()/\\=+|]*)?(?:[sS][123]|[A-Za-z])[()/\\=+|]*)+").unwrap()
});

fn letter(c: char) -> Option<char> {
    let greek = match c.to_ascii_lowercase() {
        'a' => 'α',
        'b' => 'β',
        'g' => 'γ',
        'd' => 'δ',
        'e' => 'ε',
        'z' => 'ζ',
        'h' => 'η',
        'q' => 'θ',
        'i' => 'ι',
        'k' => 'κ',
        'l' => 'λ',
        'm' => 'μ',
        'n' => 'ν',
        'c' => 'ξ',
        'o' => 'ο',
        'p' => 'π',
        'r' => 'ρ',
        's' => 'σ',
        't' => 'τ',
        'u' => 'υ',
        'f' => 'φ',
        'x' => 'χ',
        'y' => 'ψ',
        'w' => 'ω',
        'v' => 'ϝ',
        _ => return None,
    };
    Some(greek)
}

fn diacritic(c: char) -> Option<char> {
    let mark = match c {
        ')' => '\u{0313}',
        '(' => '\u{0314}',
        '/' => '\u{0301}',
        '\\' => '\u{0300}',
        '=' => '\u{0342}',
        '+' => '\u{0308}',
        '|' => '\u{0345}',
        _ => return None,
    };
    Some(mark)
}

fn ascii_letter(c: char) -> Option<char> {
    let ascii = match c {
        'α' => 'a',
        'β' => 'b',
        'γ' => 'g',
        'δ' => 'd',
        'ε' => 'e',
        'ζ' => 'z',
        'η' => 'h',
        'θ' => 'q',
        'ι' => 'i',
        'κ' => 'k',
        'λ' => 'l',
        'μ' => 'm',
        'ν' => 'n',
        'ξ' => 'c',
        'ο' => 'o',
        'π' => 'p',
        'ρ' => 'r',
        'σ' | 'ς' | 'ϲ' => 's',
        'τ' => 't',
        'υ' => 'u',
        'φ' => 'f',
        'χ' => 'x',
        'ψ' => 'y',
        'ω' => 'w',
        'ϝ' => 'v',
        _ => return None,
    };
    Some(ascii)
}

fn ascii_diacritic(c: char) -> Option<char> {
    let ascii = match c {
        '\u{0313}' => ')',
        '\u{0314}' => '(',
        '\u{0301}' => '/',
        '\u{0300}' => '\\',
        '\u{0342}' => '=',
        '\u{0308}' => '+',
        '\u{0345}' => '|',
        _ => return None,
    };
    Some(ascii)
}

pub fn has_latin_letters(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Converts betacode to NFD Greek. Characters outside betacode pass through.
pub fn to_greek(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut chars = text.chars().peekable();
    let mut capital = false;
    let mut held_marks = String::new();

    while let Some(c) = chars.next() {
        if c == '*' {
            capital = true;
            continue;
        }
        if let Some(mark) = diacritic(c) {
            if capital {
                held_marks.push(mark);
            } else {
                out.push(mark);
            }
            continue;
        }
        match letter(c) {
            Some(mut greek) => {
                if greek == 'σ' {
                    match chars.peek() {
                        Some('1') => {
                            chars.next();
                        }
                        Some('2') => {
                            chars.next();
                            greek = 'ς';
                        }
                        Some('3') => {
                            chars.next();
                            greek = 'ϲ';
                        }
                        Some(next) if next.is_ascii_alphabetic() => {}
                        _ => greek = 'ς',
                    }
                }
                if capital {
                    out.extend(greek.to_uppercase());
                    out.push_str(&held_marks);
                    held_marks.clear();
                    capital = false;
                } else {
                    out.push(greek);
                }
            }
            None => {
                out.push_str(&held_marks);
                held_marks.clear();
                capital = false;
                out.push(c);
            }
        }
    }
    out.push_str(&held_marks);
    nfd(&out)
}

/// Converts Greek to lower-case betacode, capitals prefixed with `*`.
pub fn to_betacode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in nfd(text).chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        if let Some(ascii) = ascii_letter(lower) {
            if lower != c {
                out.push('*');
            }
            out.push(ascii);
        } else if let Some(ascii) = ascii_diacritic(c) {
            out.push(ascii);
        } else {
            out.push(c);
        }
    }
    out
}

/// Replaces every betacode run in running text with Greek.
pub fn transliterate_text(text: &str) -> String {
    if !has_latin_letters(text) {
        return text.to_string();
    }
    BETACODE_RUN
        .replace_all(text, |caps: &regex::Captures| {
            // A bracket closing the run is punctuation, not a breathing.
            let run = caps[0].trim_end_matches(['(', ')']);
            format!("{}{}", to_greek(run), &caps[0][run.len()..])
        })
        .into_owned()
}
