//! Graph construction
//!
//!     The walker is the state machine that turns a lexed document (or a
//!     table) into calls on a [`GraphSink`](crate::tf::graph::GraphSink).
//!     Both front ends share one [`emitter`] that owns the text side of the
//!     work: tokenizing, normalizing and lemmatizing text runs, holding the
//!     most recent word back until its trailing punctuation is known, and
//!     running the sentence and phrase counters.
//!
//!     Structure is handled by the front ends:
//!
//!         xml: sections from the inferred schema, annotation spans for
//!              every other element, non-text tags and feature attributes
//!         rows: one section level per reference column
//!
//!     Every node is terminated with at least one slot. A node that would
//!     end up empty receives a placeholder slot first, which is reported as
//!     a diagnostic rather than an error.

mod emitter;
pub mod rows;
pub mod xml;

pub use rows::walk_table;
pub use xml::walk;

use crate::tf::diagnostics::Diagnostic;
use crate::tf::graph::GraphError;
use crate::tf::lemmatizing::LemmaTally;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    Graph(GraphError),
    /// No word slot was produced and empty documents are dropped.
    EmptyDocument,
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::Graph(err) => write!(f, "graph error: {}", err),
            WalkError::EmptyDocument => write!(f, "document produced no slots"),
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkError::Graph(err) => Some(err),
            WalkError::EmptyDocument => None,
        }
    }
}

impl From<GraphError> for WalkError {
    fn from(err: GraphError) -> Self {
        WalkError::Graph(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccentCounts {
    pub reconstructed: usize,
    pub skipped: usize,
}

/// What one walk produced besides the graph itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// All slots, placeholders included.
    pub slots: usize,
    pub placeholders: usize,
    pub tally: LemmaTally,
    /// Normalizer rewrites by kind.
    pub rewrites: BTreeMap<String, usize>,
    pub accents: AccentCounts,
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkReport {
    /// Slots that hold a word.
    pub fn words(&self) -> usize {
        self.slots - self.placeholders
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Drop a document without words instead of giving it a placeholder slot.
    pub ignore_empty: bool,
    /// Value of the document node's feature.
    pub document_name: String,
}

impl WalkOptions {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            ignore_empty: true,
            document_name: document_name.into(),
        }
    }

    pub fn with_ignore_empty(mut self, ignore_empty: bool) -> Self {
        self.ignore_empty = ignore_empty;
        self
    }
}
