//! Codepoint classes used by the segmenter

use unicode_normalization::char::is_combining_mark;

/// The four classes every codepoint collapses into.
///
/// Digits and symbols fall into `Punctuation`: only alphabetic codepoints
/// can start a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Letter,
    Mark,
    Space,
    Punctuation,
}

pub fn classify(c: char) -> CharClass {
    if is_combining_mark(c) {
        CharClass::Mark
    } else if c.is_alphabetic() {
        CharClass::Letter
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punctuation
    }
}

/// A codepoint that may start a word.
pub fn is_letter(c: char) -> bool {
    classify(c) == CharClass::Letter
}

/// A codepoint that may continue a word: a letter or a combining mark.
pub fn is_word_char(c: char) -> bool {
    matches!(classify(c), CharClass::Letter | CharClass::Mark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('α', CharClass::Letter)]
    #[case('Ω', CharClass::Letter)]
    #[case('w', CharClass::Letter)]
    #[case('\u{0301}', CharClass::Mark)]
    #[case('\u{0345}', CharClass::Mark)]
    #[case(' ', CharClass::Space)]
    #[case('\t', CharClass::Space)]
    #[case('.', CharClass::Punctuation)]
    #[case('7', CharClass::Punctuation)]
    #[case('\u{1FBD}', CharClass::Punctuation)]
    #[case('-', CharClass::Punctuation)]
    fn test_classify(#[case] c: char, #[case] expected: CharClass) {
        assert_eq!(classify(c), expected);
    }

    #[test]
    fn test_marks_continue_but_never_start_words() {
        assert!(is_word_char('\u{0313}'));
        assert!(!is_letter('\u{0313}'));
    }
}
