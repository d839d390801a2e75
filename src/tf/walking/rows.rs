//! Walker over tabular rows
//!
//! Every reference column is a section level, outermost first. When a value
//! changes, the levels from that column down are closed, deepest first,
//! and reopened with the row's values.

use super::emitter::Emitter;
use super::{WalkError, WalkOptions, WalkReport};
use crate::tf::diagnostics::Location;
use crate::tf::graph::{GraphSink, NodeId};
use crate::tf::language::LanguageConfig;
use crate::tf::lemmatizing::LemmaTable;
use crate::tf::tabular::Table;

pub fn walk_table<S: GraphSink>(
    table: &Table,
    config: &LanguageConfig,
    lemmas: Option<&LemmaTable>,
    options: &WalkOptions,
    sink: &mut S,
) -> Result<WalkReport, WalkError> {
    let mut out = Emitter::new(sink, config, lemmas);
    let document = out.sink.create_node(&config.document_level)?;
    out.sink
        .set_feature(document, &config.document_level, &options.document_name)?;

    let mut open: Vec<(String, NodeId)> = Vec::new();
    for row in &table.rows {
        let changed = (0..table.columns.len()).find(|&i| open.get(i).map(|(value, _)| value) != Some(&row.refs[i]));
        if let Some(from) = changed {
            out.flush_carry()?;
            out.flush()?;
            out.suspend_counters()?;
            while open.len() > from {
                if let Some((_, node)) = open.pop() {
                    out.close_node(node, &table.columns[open.len()])?;
                }
            }
            for (level, value) in table.columns.iter().zip(&row.refs).skip(from) {
                let node = out.sink.create_node(level)?;
                out.sink.set_feature(node, level, value)?;
                open.push((value.clone(), node));
            }
            tracing::debug!(
                row = %Location::Row(row.line),
                from = %table.columns[from],
                "reference changed"
            );
            out.resume_counters()?;
        }

        let mut text = row.text.clone();
        if !text.ends_with(|c| config.segment_mode.is_non_splitter(c)) {
            text.push(' ');
        }
        out.run(&text)?;
    }

    out.flush_carry()?;
    out.flush()?;
    out.check_words(options.ignore_empty)?;
    out.end_counters()?;
    while let Some((_, node)) = open.pop() {
        out.close_node(node, &table.columns[open.len()])?;
    }
    out.finish(document)
}
