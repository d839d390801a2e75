//! Tag boundary detection
//!
//! The raw document is cut at every `<`/`>` pair. Comments are consumed by a
//! callback so that markup inside them is never seen; a comment without `-->`
//! runs to the end of input.
use logos::{Lexer, Logos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentEnd {
    Closed,
    Unterminated,
}

fn comment_body(lex: &mut Lexer<Fragment>) -> CommentEnd {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            CommentEnd::Closed
        }
        None => {
            lex.bump(rest.len());
            CommentEnd::Unterminated
        }
    }
}

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Fragment {
    #[token("<!--", comment_body)]
    Comment(CommentEnd),

    // <!DOCTYPE ...>, <![CDATA[...]]> and friends
    #[regex(r"<![^<>\-][^<>]*>")]
    Declaration,

    #[regex(r"<[^<>!][^<>]*>")]
    Markup,

    #[regex(r"[^<>]+")]
    Text,

    // Unpaired angle brackets are kept as text.
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,
}

impl Fragment {
    pub fn is_text(&self) -> bool {
        matches!(self, Fragment::Text | Fragment::OpenAngle | Fragment::CloseAngle)
    }
}

/// Splits `source` into fragments with their slices. Input the lexer cannot
/// match is reported as text.
pub fn fragments(source: &str) -> Vec<(Fragment, &str)> {
    let mut lexer = Fragment::lexer(source);
    let mut out = Vec::new();
    while let Some(result) = lexer.next() {
        let fragment = result.unwrap_or(Fragment::Text);
        out.push((fragment, lexer.slice()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Fragment> {
        fragments(source).into_iter().map(|(f, _)| f).collect()
    }

    #[test]
    fn test_markup_and_text() {
        assert_eq!(
            fragments("<p>λόγος</p>"),
            vec![
                (Fragment::Markup, "<p>"),
                (Fragment::Text, "λόγος"),
                (Fragment::Markup, "</p>"),
            ]
        );
    }

    #[test]
    fn test_comment_hides_markup() {
        assert_eq!(
            fragments("a<!-- <body> -->b"),
            vec![
                (Fragment::Text, "a"),
                (Fragment::Comment(CommentEnd::Closed), "<!-- <body> -->"),
                (Fragment::Text, "b"),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        assert_eq!(
            kinds("a<!-- <p>b</p>"),
            vec![Fragment::Text, Fragment::Comment(CommentEnd::Unterminated)]
        );
    }

    #[test]
    fn test_declaration() {
        assert_eq!(kinds("<!DOCTYPE TEI><TEI>"), vec![Fragment::Declaration, Fragment::Markup]);
    }

    #[test]
    fn test_stray_brackets() {
        assert_eq!(
            kinds("a > b"),
            vec![Fragment::Text, Fragment::CloseAngle, Fragment::Text]
        );
    }
}
