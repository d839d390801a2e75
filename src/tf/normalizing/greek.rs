//! Greek rewrite pipeline

use super::accents;
use super::betacode;
use super::forms::{nfd, plain_low};
use super::rules::{elision_key, is_elision_sign, RuleTables, ELISION_MARK};
use super::{strip_interior, AccentStatus, NormalizedToken, Rewrite};
use crate::tf::segmenting::Token;
use unicode_normalization::char::is_combining_mark;

/// Manuscript stroke standing for a final nu.
const NU_STROKE: char = '\u{00AF}';

/// Stroke written over a contracted sacred name.
const OVERLINE: char = '\u{0305}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    None,
    Post,
    Pre,
    Both,
}

/// Elision keys to accept: exact hits win over crasis, plain hits do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Exact,
    Plain,
}

pub fn normalize(token: &Token, rules: &RuleTables, supply_accents: bool) -> Vec<NormalizedToken> {
    let mut shared = Vec::new();
    let mut pre = token.pre.clone();
    let mut post = token.post.clone();
    let mut word = nfd(&token.core);

    if betacode::has_latin_letters(&word) {
        let greek = betacode::to_greek(&word);
        shared.push(Rewrite::Transliterated {
            from: std::mem::replace(&mut word, greek),
        });
    }
    let unified: String = word
        .chars()
        .map(|c| match c {
            'ϲ' => 'σ',
            c if is_elision_sign(c) => ELISION_MARK,
            c => c,
        })
        .collect();
    if unified != word {
        shared.push(Rewrite::ScriptVariant);
        word = unified;
    }
    if let Some(rest) = post.strip_prefix(NU_STROKE) {
        word.push('ν');
        post = rest.to_string();
        shared.push(Rewrite::NuAbbreviation);
    }
    let (kept, removed) = strip_interior(&word, |c| c == ELISION_MARK);
    if !removed.is_empty() {
        shared.push(Rewrite::InteriorRemoved { removed });
    }
    word = kept;

    let lower = word.to_lowercase();
    let exact = resolve_elision(&lower, &mut pre, &mut post, rules, Lookup::Exact);
    let crasis = match exact {
        Some(_) => None,
        None => resolve_crasis(&lower, &mut post, rules),
    };
    let elided = if exact.is_none() && crasis.is_none() {
        resolve_elision(&lower, &mut pre, &mut post, rules, Lookup::Plain)
    } else {
        exact
    };
    let words: Vec<String> = if let Some(resolved) = elided {
        shared.push(Rewrite::Elision {
            from: word.clone(),
            to: resolved.clone(),
        });
        vec![resolved]
    } else if let Some(resolved) = crasis {
        shared.push(Rewrite::Crasis {
            from: word.clone(),
            to: resolved.clone(),
        });
        resolved
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![release_marks(&word, &mut pre, &mut post)]
    };

    let count = words.len();
    words
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let (w, mut rewrites) = correct_word(&w, rules);
            let (w, accent) = if supply_accents {
                accents::reconstruct(&w)
            } else {
                (w, AccentStatus::NotNeeded)
            };
            let (p, q) = match (count, i) {
                (1, _) => (pre.clone(), post.clone()),
                (_, 0) => (pre.clone(), " ".to_string()),
                (_, i) if i + 1 == count => (String::new(), post.clone()),
                _ => (String::new(), " ".to_string()),
            };
            let mut all = shared.clone();
            all.append(&mut rewrites);
            NormalizedToken {
                token: Token::new(p, w, q),
                accent,
                rewrites: all,
            }
        })
        .collect()
}

/// Looks the word up in the elision table with the mark reattached after,
/// inside, before, and on both sides, in that order. `Exact` only accepts
/// the form as written, `Plain` also accepts it with diacritics stripped. A
/// mark found in `pre`/`post` is consumed.
fn resolve_elision(
    word: &str,
    pre: &mut String,
    post: &mut String,
    rules: &RuleTables,
    lookup: Lookup,
) -> Option<String> {
    if word.is_empty() || rules.elision_plain.is_empty() {
        return None;
    }
    let m = ELISION_MARK;
    // Mark-after comes first: a bare core that is itself a table key is rare.
    let candidates = [
        (format!("{word}{m}"), Attach::Post),
        (word.to_string(), Attach::None),
        (format!("{m}{word}"), Attach::Pre),
        (format!("{m}{word}{m}"), Attach::Both),
    ];
    for (key, attach) in candidates {
        let resolved = match lookup {
            Lookup::Exact => rules.elision.get(&key).cloned(),
            Lookup::Plain => rules.elision_plain.get(&elision_key(&key)).cloned(),
        };
        let Some(resolved) = resolved else {
            continue;
        };
        if matches!(attach, Attach::Post | Attach::Both) {
            if let Some(first) = post.chars().next().filter(|c| is_elision_sign(*c)) {
                post.drain(..first.len_utf8());
            }
        }
        if matches!(attach, Attach::Pre | Attach::Both) {
            if pre.chars().last().is_some_and(is_elision_sign) {
                pre.pop();
            }
        }
        return Some(resolved);
    }
    None
}

/// Looks the word up in the crasis table, then with an elision mark from
/// `post` reattached. A reattached mark is consumed.
fn resolve_crasis<'r>(word: &str, post: &mut String, rules: &'r RuleTables) -> Option<&'r String> {
    if let Some(resolved) = rules.crasis.get(word) {
        return Some(resolved);
    }
    let first = post.chars().next().filter(|c| is_elision_sign(*c))?;
    let resolved = rules.crasis.get(&format!("{word}{ELISION_MARK}"))?;
    post.drain(..first.len_utf8());
    Some(resolved)
}

/// Moves unresolved elision marks out of the word: leading ones to `pre`,
/// trailing ones to `post`. Interior marks are dropped.
fn release_marks(word: &str, pre: &mut String, post: &mut String) -> String {
    if !word.contains(ELISION_MARK) {
        return word.to_string();
    }
    let trimmed_start = word.trim_start_matches(ELISION_MARK);
    let leading = word.len() - trimmed_start.len();
    let trimmed = trimmed_start.trim_end_matches(ELISION_MARK);
    pre.push_str(&word[..leading]);
    post.insert_str(0, &trimmed_start[trimmed.len()..]);
    trimmed.chars().filter(|c| *c != ELISION_MARK).collect()
}

/// Drops `count` letters, with their marks, from the end of `word`.
fn strip_last_letters(word: &str, count: usize) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    for _ in 0..count {
        while chars.last().is_some_and(|c| is_combining_mark(*c)) {
            chars.pop();
        }
        chars.pop();
    }
    chars.into_iter().collect()
}

fn correct_word(word: &str, rules: &RuleTables) -> (String, Vec<Rewrite>) {
    let mut rewrites = Vec::new();
    if word.contains(',') {
        return (word.to_string(), rewrites);
    }
    let plain = plain_low(word);
    let mut w = word.to_string();

    if rules.movable_nu.contains(&plain) {
        w = strip_last_letters(&w, 1);
        rewrites.push(Rewrite::MovableNu);
    }
    if w.ends_with('σ') {
        w.pop();
        w.push('ς');
        rewrites.push(Rewrite::FinalSigma);
    }
    if let Some(form) = rules.final_forms.get(&plain) {
        let mut next = strip_last_letters(&w, form.strip);
        next.push_str(&form.append);
        rewrites.push(Rewrite::FinalForm {
            from: w.clone(),
            to: next.clone(),
        });
        w = next;
    } else if let Some(full) = rules.nomina_sacra.get(&plain).filter(|_| is_contraction(word)) {
        rewrites.push(Rewrite::NominaSacra {
            from: w.clone(),
            to: full.clone(),
        });
        w = full.clone();
    }
    (w, rewrites)
}

/// Sacred-name contractions carry no accents or breathings, at most an overline.
fn is_contraction(word: &str) -> bool {
    nfd(word)
        .chars()
        .filter(|c| is_combining_mark(*c))
        .all(|c| c == OVERLINE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> std::sync::Arc<RuleTables> {
        RuleTables::greek().expect("embedded tables parse")
    }

    fn cores(out: &[NormalizedToken]) -> Vec<String> {
        out.iter().map(|t| t.token.core.clone()).collect()
    }

    fn has(out: &NormalizedToken, kind: &str) -> bool {
        out.rewrites.iter().any(|r| r.kind() == kind)
    }

    #[test]
    fn test_crasis_splits_into_words() {
        let out = normalize(&Token::new("«", "χὠ", " "), &rules(), true);
        assert_eq!(cores(&out), vec![nfd("καὶ"), nfd("ὁ")]);
        assert_eq!(out[0].token.pre, "«");
        assert_eq!(out[0].token.post, " ");
        assert_eq!(out[1].token.pre, "");
        assert_eq!(out[1].token.post, " ");
        assert!(has(&out[0], "crasis"));
    }

    #[test]
    fn test_elision_consumes_mark_in_post() {
        let out = normalize(&Token::new("", "δ", "᾽ "), &rules(), true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].token, Token::new("", nfd("δέ"), " "));
        assert!(has(&out[0], "elision"));
    }

    #[test]
    fn test_elision_accepts_any_sign() {
        let out = normalize(&Token::new("", "ἀλλ", "’ "), &rules(), true);
        assert_eq!(out[0].token, Token::new("", nfd("ἀλλά"), " "));
    }

    #[test]
    fn test_elision_with_mark_inside_core() {
        let out = normalize(&Token::word("δʼ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("δέ"));
        assert!(has(&out[0], "script_variant"));
    }

    #[test]
    fn test_prodelision_consumes_pre_mark() {
        let out = normalize(&Token::new("᾽", "στί", ""), &rules(), true);
        assert_eq!(out[0].token, Token::new("", nfd("ἐστί"), ""));
    }

    #[test]
    fn test_elision_precedes_crasis() {
        let yaml = "elision:\n  \"κἀν᾽\": \"κἀνά\"\ncrasis:\n  \"κἀν\": \"καὶ ἐν\"\n";
        let tables = RuleTables::from_yaml(yaml).expect("parses");
        let out = normalize(&Token::word("κἀν"), &tables, false);
        assert_eq!(cores(&out), vec![nfd("κἀνά")]);
        assert!(!has(&out[0], "crasis"));
    }

    #[test]
    fn test_elided_crasis_beats_plain_elision() {
        let out = normalize(&Token::new("", "κἆθ", "’ "), &rules(), false);
        assert_eq!(cores(&out), vec![nfd("καὶ"), nfd("εἶτα")]);
        assert_eq!(out[1].token.post, " ");
        assert!(has(&out[0], "crasis"));
    }

    #[test]
    fn test_movable_nu_and_final_sigma() {
        let out = normalize(&Token::word("ἐστὶν"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("ἐστὶ"));
        assert!(has(&out[0], "movable_nu"));

        let out = normalize(&Token::word("λόγοσ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("λόγος"));
        assert!(has(&out[0], "final_sigma"));
    }

    #[test]
    fn test_lunate_sigma_is_unified() {
        let out = normalize(&Token::word("λόγοϲ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("λόγος"));
    }

    #[test]
    fn test_final_forms() {
        let out = normalize(&Token::word("οὐκ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("οὐ"));
        let out = normalize(&Token::word("ἐξ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("ἐκ"));
    }

    #[test]
    fn test_nomina_sacra_by_plain_form() {
        let out = normalize(&Token::word("θ\u{0305}ς\u{0305}"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("θεός"));
        assert!(has(&out[0], "nomina_sacra"));
    }

    #[test]
    fn test_accented_word_is_not_a_sacred_name() {
        let out = normalize(&Token::word("θῶ"), &rules(), false);
        assert_eq!(out[0].token.core, nfd("θῶ"));
        assert!(!has(&out[0], "nomina_sacra"));
    }

    #[test]
    fn test_nu_stroke() {
        let out = normalize(&Token::new("", "τὸ", "¯ "), &rules(), true);
        assert_eq!(out[0].token, Token::new("", nfd("τὸν"), " "));
    }

    #[test]
    fn test_betacode_core() {
        let out = normalize(&Token::word("kai\\"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("καὶ"));
        assert!(has(&out[0], "transliterated"));
    }

    #[test]
    fn test_accent_status_is_observable() {
        let out = normalize(&Token::word("λογος"), &rules(), true);
        assert_eq!(out[0].accent, AccentStatus::Reconstructed);
        let out = normalize(&Token::word("λογος"), &rules(), false);
        assert_eq!(out[0].accent, AccentStatus::NotNeeded);
        assert_eq!(out[0].token.core, "λογος");
        let out = normalize(&Token::word("ββ"), &rules(), true);
        assert_eq!(out[0].accent, AccentStatus::Skipped);
    }

    #[test]
    fn test_unresolved_marks_are_released() {
        let out = normalize(&Token::word("λόγος\u{02BC}"), &rules(), false);
        assert_eq!(out[0].token, Token::new("", nfd("λόγος"), "\u{1FBD}"));
    }

    #[test]
    fn test_case_is_kept_without_table_hit() {
        let out = normalize(&Token::word("Ἀνήρ"), &rules(), true);
        assert_eq!(out[0].token.core, nfd("Ἀνήρ"));
        assert_eq!(out[0].accent, AccentStatus::NotNeeded);
    }
}
