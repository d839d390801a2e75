//! Shared test factories
//!
//! Small helpers used by unit tests and the integration tests under
//! `tests/`. They panic on setup failures, which is what a test wants.

use crate::tf::graph::MemoryGraph;
use crate::tf::language::LanguageConfig;
use crate::tf::lexing::lex;
use crate::tf::schema::infer;
use crate::tf::segmenting::Token;
use crate::tf::walking::{walk, WalkError, WalkOptions, WalkReport};

/// Document name given to every walked test document.
pub const TEST_DOCUMENT: &str = "doc";

pub fn tok(pre: &str, core: &str, post: &str) -> Token {
    Token::new(pre, core, post)
}

pub fn greek_config() -> LanguageConfig {
    LanguageConfig::greek().expect("embedded greek tables to parse")
}

/// Lexes, infers and walks `raw` into a fresh in-memory graph.
pub fn walk_xml(raw: &str, config: &LanguageConfig) -> Result<(MemoryGraph, WalkReport), WalkError> {
    walk_xml_with(raw, config, &WalkOptions::new(TEST_DOCUMENT))
}

pub fn walk_xml_with(
    raw: &str,
    config: &LanguageConfig,
    options: &WalkOptions,
) -> Result<(MemoryGraph, WalkReport), WalkError> {
    let items = lex(raw, config).items;
    let schema = infer(&items, &config.schema_keys);
    let mut graph = MemoryGraph::new(config.slot_type.clone());
    let report = walk(&items, &schema, config, None, options, &mut graph)?;
    Ok((graph, report))
}

/// The operation log, one operation per line.
pub fn render_ops(graph: &MemoryGraph) -> String {
    graph
        .ops()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
