//! Delimited tabular input
//!
//!     One row per line. The leading columns are hierarchical references,
//!     outermost first, and the last column is raw text. Only the reference
//!     columns are split on the delimiter: the text column keeps whatever
//!     delimiters it contains.
//!
//!     The dialect is sniffed from a sample when no delimiter is configured.
//!     A candidate wins when it occurs outside quotes on every sampled line,
//!     and a candidate with the same count on every line beats one whose
//!     count varies. Without any winner the input is read as a single text
//!     column.

use crate::tf::diagnostics::{self, Diagnostic, Location};
use serde::Serialize;
use std::fmt;

/// Delimiters tried by the sniffer, in order of preference.
pub const CANDIDATES: [char; 4] = ['\t', ',', ';', '|'];

const QUOTE: char = '"';
const SAMPLE_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabularError {
    Empty,
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    MissingHeader {
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for TabularError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabularError::Empty => write!(f, "tabular input has no rows"),
            TabularError::RaggedRow {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {} has {} columns, expected {}",
                line, found, expected
            ),
            TabularError::MissingHeader { expected, found } => write!(
                f,
                "{} reference columns but only {} column names given",
                expected, found
            ),
        }
    }
}

impl std::error::Error for TabularError {}

/// Whether the first row names the reference columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPolicy {
    Present,
    /// No header row; the reference columns get these names.
    Absent(Vec<String>),
    Detect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dialect {
    pub delimiter: Option<char>,
    pub quoted: bool,
    /// Number of columns, text column included.
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Source line, 1-based.
    pub line: usize,
    pub refs: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub dialect: Dialect,
    /// Names of the reference columns, outermost first.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub header_detected: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Counts `delimiter` outside double quotes.
fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for c in line.chars() {
        if c == QUOTE {
            quoted = !quoted;
        } else if c == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

pub fn sniff(sample: &str) -> Dialect {
    let lines: Vec<&str> = content_lines(sample)
        .take(SAMPLE_LINES)
        .map(|(_, line)| line)
        .collect();
    let quoted = lines.iter().any(|line| line.contains(QUOTE));

    let mut fallback: Option<(char, usize)> = None;
    for delimiter in CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|l| count_unquoted(l, delimiter)).collect();
        let Some(&min) = counts.iter().min() else {
            break;
        };
        if min == 0 {
            continue;
        }
        if counts.iter().all(|&c| c == min) {
            return Dialect {
                delimiter: Some(delimiter),
                quoted,
                columns: min + 1,
            };
        }
        if fallback.is_none() {
            fallback = Some((delimiter, min));
        }
    }
    match fallback {
        Some((delimiter, min)) => Dialect {
            delimiter: Some(delimiter),
            quoted,
            columns: min + 1,
        },
        None => Dialect {
            delimiter: None,
            quoted,
            columns: 1,
        },
    }
}

fn unquote(field: &str) -> String {
    let trimmed = field.trim();
    match trimmed
        .strip_prefix(QUOTE)
        .and_then(|rest| rest.strip_suffix(QUOTE))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => trimmed.to_string(),
    }
}

/// Splits `line` into at most `columns` fields; the last field takes the
/// rest of the line.
pub fn split_row(line: &str, delimiter: Option<char>, columns: usize) -> Vec<String> {
    let Some(delimiter) = delimiter else {
        return vec![unquote(line)];
    };
    let mut fields = Vec::with_capacity(columns);
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        if fields.len() + 1 == columns {
            break;
        }
        if c == QUOTE {
            quoted = !quoted;
        } else if c == delimiter && !quoted {
            fields.push(unquote(&line[start..i]));
            start = i + c.len_utf8();
        }
    }
    fields.push(unquote(&line[start..]));
    fields
}

fn looks_like_header(first: &[String], rest: &[Vec<String>]) -> bool {
    let has_digit = |s: &str| s.chars().any(|c| c.is_ascii_digit());
    let refs = first.len().saturating_sub(1);
    refs > 0
        && first[..refs].iter().all(|f| !f.is_empty() && !has_digit(f))
        && rest.iter().any(|row| row[..refs.min(row.len())].iter().any(|f| has_digit(f)))
}

fn default_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("level{}", i)).collect()
}

/// Reads `text` into a table. `delimiter` overrides the sniffed one.
pub fn parse_table(
    text: &str,
    policy: &HeaderPolicy,
    delimiter: Option<char>,
) -> Result<Table, TabularError> {
    let mut dialect = sniff(text);
    if let Some(delimiter) = delimiter {
        let columns = content_lines(text)
            .map(|(_, line)| count_unquoted(line, delimiter))
            .min()
            .unwrap_or(0)
            + 1;
        dialect = Dialect {
            delimiter: Some(delimiter),
            columns,
            ..dialect
        };
    }

    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    for (line, content) in content_lines(text) {
        let fields = split_row(content, dialect.delimiter, dialect.columns);
        if fields.len() != dialect.columns {
            return Err(TabularError::RaggedRow {
                line,
                expected: dialect.columns,
                found: fields.len(),
            });
        }
        rows.push((line, fields));
    }
    if rows.is_empty() {
        return Err(TabularError::Empty);
    }

    let refs = dialect.columns - 1;
    let mut reported = Vec::new();
    let header = match policy {
        HeaderPolicy::Present => true,
        HeaderPolicy::Absent(_) => false,
        HeaderPolicy::Detect => {
            let rest: Vec<Vec<String>> = rows[1..].iter().map(|(_, f)| f.clone()).collect();
            let detected = looks_like_header(&rows[0].1, &rest);
            if detected {
                reported.push(
                    Diagnostic::info(format!("treating line {} as header", rows[0].0))
                        .with_code(diagnostics::TABULAR_HEADER_DETECTED)
                        .at(Location::Row(rows[0].0)),
                );
            }
            detected
        }
    };

    let columns = if header {
        let (_, names) = rows.remove(0);
        names[..refs].to_vec()
    } else if let HeaderPolicy::Absent(names) = policy {
        if names.len() < refs {
            return Err(TabularError::MissingHeader {
                expected: refs,
                found: names.len(),
            });
        }
        names[..refs].to_vec()
    } else {
        default_names(refs)
    };

    let rows = rows
        .into_iter()
        .map(|(line, mut fields)| {
            let text = fields.pop().unwrap_or_default();
            TableRow {
                line,
                refs: fields,
                text,
            }
        })
        .collect();

    tracing::debug!(
        delimiter = ?dialect.delimiter,
        columns = dialect.columns,
        header,
        "read tabular input"
    );
    Ok(Table {
        dialect,
        columns,
        rows,
        header_detected: header && *policy == HeaderPolicy::Detect,
        diagnostics: reported,
    })
}
