//! Walker over lexed XML items

use super::emitter::Emitter;
use super::{WalkError, WalkOptions, WalkReport};
use crate::tf::diagnostics::{self, Diagnostic, Location};
use crate::tf::graph::{GraphError, GraphSink, NodeId};
use crate::tf::language::LanguageConfig;
use crate::tf::lemmatizing::LemmaTable;
use crate::tf::lexing::{Attributes, LexItem};
use crate::tf::schema::{Schema, SchemaEntry};
use std::collections::BTreeMap;

/// An element seen open and not yet closed.
#[derive(Debug)]
struct OpenElement {
    name: String,
    /// Annotation and feature-attribute nodes ending with the element.
    owned: Vec<(String, NodeId)>,
    /// Section opened by the element: depth and node.
    section: Option<(usize, NodeId)>,
    non_text: bool,
}

impl OpenElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owned: Vec::new(),
            section: None,
            non_text: false,
        }
    }
}

/// Node of a non-text tag and the text gathered for it.
struct NonText {
    node: NodeId,
    text: String,
}

struct XmlWalker<'a, S: GraphSink> {
    out: Emitter<'a, S>,
    config: &'a LanguageConfig,
    schema: &'a Schema,
    stack: Vec<OpenElement>,
    /// Active section node per depth.
    sections: BTreeMap<usize, (String, NodeId)>,
    /// Latest annotation node per level.
    annotations: BTreeMap<String, NodeId>,
    non_text: BTreeMap<String, NonText>,
    /// Occurrences so far of each tag without a value.
    counts: BTreeMap<String, usize>,
    /// Synthesized section per level, until a real one of the level opens.
    synthesized: BTreeMap<String, NodeId>,
    index: usize,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Level feature and value-key feature of an element, empty when it has no value.
fn labels(level: &str, entry: Option<&SchemaEntry>, attrs: &Attributes) -> Vec<(String, String)> {
    let Some((entry, value)) = entry.and_then(|e| e.value(attrs).map(|v| (e, v))) else {
        return Vec::new();
    };
    let mut labels = vec![(level.to_string(), value.to_string())];
    if let Some(key) = entry.value_key.as_deref().filter(|key| *key != level) {
        labels.push((key.to_string(), value.to_string()));
    }
    labels
}

/// The number before a numeric section value.
fn preceding(value: &str) -> Option<String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<i64>().ok().map(|n| (n - 1).to_string())
}

impl<'a, S: GraphSink> XmlWalker<'a, S> {
    /// Sets the level feature and the value-key feature of a new node.
    fn label(&mut self, node: NodeId, features: &[(String, String)]) -> Result<(), GraphError> {
        for (name, value) in features {
            self.out.sink.set_feature(node, name, value)?;
        }
        Ok(())
    }

    /// The element's labels, or the running count of its level.
    fn counted(&mut self, level: &str, entry: Option<&SchemaEntry>, attrs: &Attributes) -> Vec<(String, String)> {
        let features = labels(level, entry, attrs);
        if !features.is_empty() {
            return features;
        }
        let count = self.counts.entry(level.to_string()).or_insert(0);
        *count += 1;
        vec![(level.to_string(), count.to_string())]
    }

    fn structural_break(&mut self) -> Result<(), GraphError> {
        self.out.flush_carry()?;
        self.out.flush()
    }

    fn text(&mut self, content: &str) -> Result<(), GraphError> {
        let holder = self.stack.iter().rev().find(|e| e.non_text).map(|e| e.name.as_str());
        if let Some(gathered) = holder.and_then(|tag| self.non_text.get_mut(tag)) {
            gathered.text.push_str(content);
            return Ok(());
        }
        self.out.run(content)
    }

    fn open(&mut self, name: &str, attrs: &Attributes, self_closing: bool) -> Result<(), GraphError> {
        let (schema, config) = (self.schema, self.config);
        let entry = if attrs.is_empty() {
            None
        } else {
            schema.lookup(&config.schema_keys, name, attrs)
        };

        if !self_closing && config.non_text_tags.contains(name) {
            return self.open_non_text(name);
        }
        if let Some(entry) = entry.filter(|e| e.is_section) {
            let level = entry.feature_name(name, attrs);
            if let Some(depth) = schema.depth(&level) {
                return self.open_section(name, &level, depth, entry, attrs, self_closing);
            }
        }
        let level = entry.map_or_else(|| name.to_string(), |e| e.feature_name(name, attrs));
        if self_closing {
            let features = self.counted(&level, entry, attrs);
            return self.out.milestone(&level, features);
        }

        self.structural_break()?;
        let mut element = OpenElement::new(name);
        let previous = self.annotations.get(&level).copied();
        let reusable = match previous {
            Some(node) => self.out.sink.is_active(node)? && !self.out.sink.is_linked(node)?,
            None => false,
        };
        let node = match previous {
            Some(node) if reusable => node,
            _ => {
                if let Some(node) = previous {
                    self.out.close_node(node, &level)?;
                }
                self.out.sink.create_node(&level)?
            }
        };
        let features = self.counted(&level, entry, attrs);
        self.label(node, &features)?;
        self.annotations.insert(level.clone(), node);
        element.owned.push((level, node));
        self.open_feature_attribs(&mut element, attrs)?;
        self.stack.push(element);
        Ok(())
    }

    fn open_feature_attribs(&mut self, element: &mut OpenElement, attrs: &Attributes) -> Result<(), GraphError> {
        for (key, value) in attrs.iter() {
            if self.config.feature_attribs.contains(key) {
                let node = self.out.sink.create_node(key)?;
                self.out.sink.set_feature(node, key, value)?;
                element.owned.push((key.to_string(), node));
            }
        }
        Ok(())
    }

    fn open_section(
        &mut self,
        name: &str,
        level: &str,
        depth: usize,
        entry: &SchemaEntry,
        attrs: &Attributes,
        self_closing: bool,
    ) -> Result<(), GraphError> {
        self.structural_break()?;
        self.out.suspend_counters()?;
        self.close_sections_from(depth)?;

        for ancestor in 0..depth {
            if self.sections.contains_key(&ancestor) {
                continue;
            }
            let missing = self.schema.levels[ancestor].clone();
            let node = self.out.sink.create_node(&missing)?;
            self.out.sink.set_feature(node, &missing, "0")?;
            self.synthesized.insert(missing.clone(), node);
            tracing::debug!(level = %missing, below = level, "synthesized ancestor section");
            self.out.diagnose(
                Diagnostic::info(format!("synthesized {} above {}", missing, level))
                    .with_code(diagnostics::ANCESTOR_SYNTHESIZED)
                    .at(Location::Item(self.index)),
            );
            self.sections.insert(ancestor, (missing, node));
        }

        if let Some(missing) = self.synthesized.remove(level) {
            if let Some(value) = entry.value(attrs).and_then(preceding) {
                self.out.sink.set_feature(missing, level, &value)?;
            }
        }
        let node = self.out.sink.create_node(level)?;
        self.label(node, &labels(level, Some(entry), attrs))?;
        self.sections.insert(depth, (level.to_string(), node));
        tracing::debug!(level, depth, value = ?entry.value(attrs), "opened section");
        self.out.resume_counters()?;

        if !self_closing {
            let mut element = OpenElement::new(name);
            element.section = Some((depth, node));
            self.open_feature_attribs(&mut element, attrs)?;
            self.stack.push(element);
        }
        Ok(())
    }

    /// Terminates the sections at `depth` and below, innermost first.
    fn close_sections_from(&mut self, depth: usize) -> Result<(), GraphError> {
        let deeper: Vec<usize> = self.sections.range(depth..).map(|(d, _)| *d).rev().collect();
        for d in deeper {
            if let Some((level, node)) = self.sections.remove(&d) {
                self.out.close_node(node, &level)?;
            }
        }
        Ok(())
    }

    fn open_non_text(&mut self, name: &str) -> Result<(), GraphError> {
        self.structural_break()?;
        if let Some(previous) = self.non_text.remove(name) {
            self.out.close_node(previous.node, name)?;
        }
        let node = self.out.sink.create_node(name)?;
        self.non_text.insert(
            name.to_string(),
            NonText {
                node,
                text: String::new(),
            },
        );
        let mut element = OpenElement::new(name);
        element.non_text = true;
        self.stack.push(element);
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), GraphError> {
        let Some(pos) = self.stack.iter().rposition(|e| e.name == name) else {
            tracing::warn!(tag = name, "close tag without open tag");
            self.out.diagnose(
                Diagnostic::warning(format!("</{}> closes nothing", name))
                    .with_code(diagnostics::UNBALANCED_CLOSE_TAG)
                    .at(Location::Item(self.index)),
            );
            return Ok(());
        };
        self.structural_break()?;
        let closing = self.stack.split_off(pos);
        for element in closing.into_iter().rev() {
            if element.name != name {
                self.out.diagnose(
                    Diagnostic::warning(format!("</{}> also closes <{}>", name, element.name))
                        .with_code(diagnostics::UNBALANCED_CLOSE_TAG)
                        .at(Location::Item(self.index)),
                );
            }
            self.close_element(element)?;
        }
        Ok(())
    }

    fn close_element(&mut self, element: OpenElement) -> Result<(), GraphError> {
        if element.non_text {
            if let Some(gathered) = self.non_text.get(&element.name) {
                let value = collapse_whitespace(&gathered.text);
                if !value.is_empty() {
                    let value = self.config.unicode_form.apply(&value);
                    self.out.sink.set_feature(gathered.node, &element.name, &value)?;
                }
            }
            return Ok(());
        }
        for (level, node) in element.owned.into_iter().rev() {
            self.out.close_node(node, &level)?;
        }
        if let Some((depth, node)) = element.section {
            if self.sections.get(&depth).map(|(_, n)| *n) == Some(node) {
                self.close_sections_from(depth)?;
            }
        }
        Ok(())
    }

    fn finish(mut self, document: NodeId, ignore_empty: bool) -> Result<WalkReport, WalkError> {
        self.structural_break()?;
        self.out.check_words(ignore_empty)?;

        let open = std::mem::take(&mut self.stack);
        for element in open.into_iter().rev() {
            self.close_element(element)?;
        }
        self.out.end_counters()?;
        self.out.end_milestones()?;
        let gathered = std::mem::take(&mut self.non_text);
        for (name, non_text) in gathered {
            self.out.close_node(non_text.node, &name)?;
        }
        self.close_sections_from(0)?;
        self.out.finish(document)
    }
}

/// Walks the body of one lexed document into `sink`.
///
/// Items before `<body>` are skipped; a document without `<body>` is read in
/// full and reported. Walking stops at `</body>`.
pub fn walk<S: GraphSink>(
    items: &[LexItem],
    schema: &Schema,
    config: &LanguageConfig,
    lemmas: Option<&LemmaTable>,
    options: &WalkOptions,
    sink: &mut S,
) -> Result<WalkReport, WalkError> {
    let body = items
        .iter()
        .position(|item| matches!(item, LexItem::DocumentBoundaryStart));
    let mut walker = XmlWalker {
        out: Emitter::new(sink, config, lemmas),
        config,
        schema,
        stack: Vec::new(),
        sections: BTreeMap::new(),
        annotations: BTreeMap::new(),
        non_text: BTreeMap::new(),
        counts: BTreeMap::new(),
        synthesized: BTreeMap::new(),
        index: 0,
    };
    let start = match body {
        Some(position) => position + 1,
        None => {
            walker.out.diagnose(
                Diagnostic::warning("no <body> found, reading the whole document")
                    .with_code(diagnostics::MISSING_BODY),
            );
            0
        }
    };

    let document = walker.out.sink.create_node(&config.document_level)?;
    walker
        .out
        .sink
        .set_feature(document, &config.document_level, &options.document_name)?;

    let empty = Attributes::new();
    for (index, item) in items.iter().enumerate().skip(start) {
        walker.index = index;
        match item {
            LexItem::DocumentBoundaryEnd => break,
            LexItem::DocumentBoundaryStart | LexItem::Comment | LexItem::ProcessingInstruction => {}
            LexItem::TextRun { content } => walker.text(content)?,
            LexItem::OpenTag { name } => walker.open(name, &empty, false)?,
            LexItem::SelfClosingTag { name } => walker.open(name, &empty, true)?,
            LexItem::AttributedTag {
                name,
                attrs,
                self_closing,
            } => walker.open(name, attrs, *self_closing)?,
            LexItem::CloseTag { name } => walker.close(name)?,
        }
    }
    walker.finish(document, options.ignore_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tf::graph::MemoryGraph;
    use crate::tf::lexing::lex;
    use crate::tf::schema::infer;
    use crate::tf::testing::{greek_config, render_ops, walk_xml};

    fn generic_walk(raw: &str) -> (MemoryGraph, WalkReport) {
        walk_xml(raw, &LanguageConfig::generic()).expect("walk")
    }

    #[test]
    fn test_section_with_value_key() {
        let (graph, report) = generic_walk("<body><div n=\"1\"><p>word</p></div></body>");
        assert!(graph.check_invariants().is_ok());
        assert_eq!(report.words(), 1);
        insta::assert_snapshot!(render_ops(&graph), @r###"
        node 0 _book
        feature 0 _book=doc
        node 1 div
        feature 1 div=1
        feature 1 n=1
        node 2 p
        feature 2 p=1
        node 3 _sentence
        feature 3 _sentence=1
        node 4 _phrase
        feature 4 _phrase=1
        slot 5
        feature 5 pre=
        feature 5 orig=word
        feature 5 main=word
        feature 5 plain=word
        feature 5 post=
        terminate 2
        terminate 1
        terminate 4
        terminate 3
        terminate 0
        "###);
    }

    #[test]
    fn test_sentence_counters_follow_punctuation() {
        let (mut graph, _) = generic_walk("<body><p>one two. three, four</p></body>");
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        let sentences: Vec<&Vec<usize>> = corpus.nodes_of("_sentence").map(|n| &n.slots).collect();
        assert_eq!(sentences, vec![&vec![1, 2], &vec![3, 4]]);
        let phrases: Vec<&Vec<usize>> = corpus.nodes_of("_phrase").map(|n| &n.slots).collect();
        assert_eq!(phrases, vec![&vec![1, 2], &vec![3], &vec![4]]);
    }

    #[test]
    fn test_punctuation_after_tag_patches_last_slot() {
        let (mut graph, report) = generic_walk("<body><p><hi>word</hi>.</p> next</body>");
        assert_eq!(report.words(), 2);
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        assert_eq!(corpus.slot_values("post"), vec![".", ""]);
        assert_eq!(corpus.nodes_of("_sentence").count(), 2);
    }

    #[test]
    fn test_empty_annotation_gets_placeholder() {
        let (graph, report) = generic_walk("<body><p>a <gap></gap> b</p></body>");
        assert!(graph.check_invariants().is_ok());
        assert_eq!(report.placeholders, 1);
        assert_eq!(diagnostics::count_code(&report.diagnostics, diagnostics::PLACEHOLDER_SLOT), 1);
    }

    #[test]
    fn test_missing_ancestor_is_synthesized() {
        let raw = "<body><div subtype=\"book\" n=\"1\">\
                   <div subtype=\"chapter\" n=\"1\">a</div></div>\
                   <div subtype=\"chapter\" n=\"2\">b</div></body>";
        let (mut graph, report) = generic_walk(raw);
        assert!(graph.check_invariants().is_ok());
        assert_eq!(diagnostics::count_code(&report.diagnostics, diagnostics::ANCESTOR_SYNTHESIZED), 1);
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        let books: Vec<&str> = corpus
            .nodes_of("book")
            .map(|n| n.features["book"].as_str())
            .collect();
        assert_eq!(books, vec!["1", "0"]);
    }

    #[test]
    fn test_unbalanced_close_tag() {
        let (graph, report) = generic_walk("<body><p>a</q> b</p></body>");
        assert!(graph.check_invariants().is_ok());
        assert_eq!(diagnostics::count_code(&report.diagnostics, diagnostics::UNBALANCED_CLOSE_TAG), 1);
        assert_eq!(report.words(), 2);
    }

    #[test]
    fn test_missing_body_reads_everything() {
        let (_, report) = generic_walk("<p>a b</p>");
        assert_eq!(report.words(), 2);
        assert_eq!(diagnostics::count_code(&report.diagnostics, diagnostics::MISSING_BODY), 1);
    }

    #[test]
    fn test_header_text_is_skipped() {
        let (_, report) = generic_walk("<teiHeader><title>T</title></teiHeader><body>a</body>");
        assert_eq!(report.words(), 1);
    }

    #[test]
    fn test_non_text_tag_becomes_feature() {
        let config = greek_config();
        let (mut graph, report) = walk_xml("<body><head>Περὶ  ψυχῆς</head><p>λόγος</p></body>", &config).expect("walk");
        assert_eq!(report.words(), 1);
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        let head = corpus.nodes_of("head").next().expect("head node");
        assert_eq!(head.features["head"], config.unicode_form.apply("Περὶ ψυχῆς"));
        assert_eq!(head.slots, vec![1]);
    }

    #[test]
    fn test_feature_attribute_opens_node() {
        let raw = "<body><p>a <seg corresp=\"#x\" type=\"q\">b c</seg> d</p></body>";
        let (mut graph, _) = generic_walk(raw);
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        let corresp = corpus.nodes_of("corresp").next().expect("corresp node");
        assert_eq!(corresp.features["corresp"], "#x");
        assert_eq!(corresp.slots, vec![2, 3]);
    }

    #[test]
    fn test_word_carried_across_line_break() {
        let (mut graph, report) = generic_walk("<body><p>syl-<lb/>lable end</p></body>");
        assert_eq!(report.words(), 2);
        let corpus = graph.finish(BTreeMap::new()).expect("finish");
        assert_eq!(corpus.slot_values("plain"), vec!["syllable", "end"]);
    }

    #[test]
    fn test_empty_document_policy() {
        let config = LanguageConfig::generic();
        let items = lex("<body><p> </p></body>", &config).items;
        let schema = infer(&items, &config.schema_keys);

        let mut graph = MemoryGraph::new("word");
        let dropped = walk(&items, &schema, &config, None, &WalkOptions::new("doc"), &mut graph);
        assert_eq!(dropped.unwrap_err(), WalkError::EmptyDocument);

        let mut graph = MemoryGraph::new("word");
        let options = WalkOptions::new("doc").with_ignore_empty(false);
        let report = walk(&items, &schema, &config, None, &options, &mut graph).expect("walk");
        assert_eq!(report.slots, 1);
        assert_eq!(report.words(), 0);
        assert!(graph.check_invariants().is_ok());
    }
}
