//! Reportable conversion events
//!
//! Irregular input is repaired and the conversion continues. Each repair is
//! recorded as a [`Diagnostic`] so that it stays observable in reports and
//! tests.
//!
//! ## Codes
//!
//! - `attribute-quoting-repaired`: single quotes in a tag were rewritten
//! - `attribute-value-corrected`: a known-bad attribute value was replaced
//! - `attribute-unparsed`: a tag with attributes that could not be split
//! - `schema-ambiguous-feature-key`: two attributes tie for a signature's feature key
//! - `placeholder-slot`: an empty node received a placeholder slot
//! - `ancestor-synthesized`: a missing section level was created with value 0
//! - `unbalanced-close-tag`: a close tag without matching open tag
//! - `unterminated-comment`: a comment running to the end of input
//! - `missing-body`: no body marker, the whole document was read as body
//! - `transliterated`: words were converted from betacode
//! - `accent-reconstruction-skipped`: an unaccented word could not be syllabified
//! - `tabular-header-detected`: the first tabular row was taken as header

use serde::Serialize;
use std::fmt;

pub const ATTRIBUTE_QUOTING_REPAIRED: &str = "attribute-quoting-repaired";
pub const ATTRIBUTE_VALUE_CORRECTED: &str = "attribute-value-corrected";
pub const ATTRIBUTE_UNPARSED: &str = "attribute-unparsed";
pub const SCHEMA_AMBIGUOUS_FEATURE_KEY: &str = "schema-ambiguous-feature-key";
pub const PLACEHOLDER_SLOT: &str = "placeholder-slot";
pub const ANCESTOR_SYNTHESIZED: &str = "ancestor-synthesized";
pub const UNBALANCED_CLOSE_TAG: &str = "unbalanced-close-tag";
pub const UNTERMINATED_COMMENT: &str = "unterminated-comment";
pub const MISSING_BODY: &str = "missing-body";
pub const TRANSLITERATED: &str = "transliterated";
pub const ACCENT_RECONSTRUCTION_SKIPPED: &str = "accent-reconstruction-skipped";
pub const TABULAR_HEADER_DETECTED: &str = "tabular-header-detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Information => write!(f, "info"),
            DiagnosticSeverity::Hint => write!(f, "hint"),
        }
    }
}

/// Where in the input an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Index into the lexed item list.
    Item(usize),
    /// Slot number, 1-based.
    Slot(usize),
    /// Tabular row, 1-based.
    Row(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Item(i) => write!(f, "item {}", i),
            Location::Slot(s) => write!(f, "slot {}", s),
            Location::Row(r) => write!(f, "row {}", r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub code: Option<String>,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            location: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Information, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

/// Number of diagnostics carrying `code`.
pub fn count_code(diagnostics: &[Diagnostic], code: &str) -> usize {
    diagnostics.iter().filter(|d| d.has_code(code)).count()
}
