//! Reconstruction of logical text from word-wrapped source lines

/// Joins trimmed, non-empty lines. A line ending in one of `markers` is
/// joined to the next without a space, all other lines with one space.
pub fn join_lines(raw: &str, markers: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut glue = false;
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(line);
        glue = line.ends_with(|c: char| markers.contains(&c));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_get_one_space() {
        assert_eq!(join_lines("  a b\n\n   c  \n", &['-']), "a b c");
    }

    #[test]
    fn test_marker_glues_next_line() {
        assert_eq!(join_lines("ἀνή-\nρ λέγει", &['-']), "ἀνή-ρ λέγει");
    }

    #[test]
    fn test_marker_mid_line_is_ignored() {
        assert_eq!(join_lines("a-b\nc", &['-']), "a-b c");
    }

    #[test]
    fn test_crlf() {
        assert_eq!(join_lines("a\r\nb\r\n", &['-']), "a b");
    }
}
