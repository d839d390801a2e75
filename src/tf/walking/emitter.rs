//! Text to slots
//!
//! The emitter keeps one word of lookahead: a normalized word is held in
//! `pending` until the next word (or a structural change) arrives, so that
//! punctuation-only triples in between extend its `post` before the slot is
//! written. Punctuation that arrives after the slot was written, across a
//! tag, is patched onto the last slot's `post` feature.
//!
//! Milestones are queued and become nodes only when the next slot is
//! written, so a milestone with no text after it leaves no empty node.

use super::{WalkError, WalkReport};
use crate::tf::diagnostics::{self, Diagnostic, DiagnosticSeverity, Location};
use crate::tf::graph::{GraphError, GraphSink, NodeId};
use crate::tf::language::{Language, LanguageConfig};
use crate::tf::lemmatizing::LemmaTable;
use crate::tf::normalizing::betacode::has_latin_letters;
use crate::tf::normalizing::forms::plain_form;
use crate::tf::normalizing::{normalize, AccentStatus, NormalizedToken, TextFormat};
use std::collections::BTreeMap;

const PRE: &str = "pre";
const POST: &str = "post";

/// A running sentence or phrase number.
struct Counter {
    level: String,
    node: Option<NodeId>,
    number: usize,
}

impl Counter {
    fn new(level: &str) -> Self {
        Self {
            level: level.to_string(),
            node: None,
            number: 1,
        }
    }

    fn open<S: GraphSink>(&mut self, sink: &mut S) -> Result<(), GraphError> {
        if self.node.is_none() {
            let node = sink.create_node(&self.level)?;
            sink.set_feature(node, &self.level, &self.number.to_string())?;
            self.node = Some(node);
        }
        Ok(())
    }

    fn end<S: GraphSink>(&mut self, sink: &mut S) -> Result<(), GraphError> {
        if let Some(node) = self.node.take() {
            if sink.is_active(node)? {
                sink.terminate(node)?;
            }
            self.number += 1;
        }
        Ok(())
    }
}

/// A self-closing tag waiting for the slot it starts at.
struct Milestone {
    level: String,
    features: Vec<(String, String)>,
}

pub(crate) struct Emitter<'a, S: GraphSink> {
    pub(crate) sink: &'a mut S,
    config: &'a LanguageConfig,
    lemmas: Option<&'a LemmaTable>,
    pending: Option<NormalizedToken>,
    /// Punctuation seen before the first slot.
    leading: String,
    /// Partial word held back across a line-wrap marker.
    carry: String,
    last_slot: Option<NodeId>,
    sentence: Counter,
    phrase: Counter,
    suspended: Vec<NodeId>,
    queued: Vec<Milestone>,
    /// Open milestone node per level, ended by the next one of its level.
    milestones: BTreeMap<String, NodeId>,
    transliterated: usize,
    report: WalkReport,
}

impl<'a, S: GraphSink> Emitter<'a, S> {
    pub(crate) fn new(sink: &'a mut S, config: &'a LanguageConfig, lemmas: Option<&'a LemmaTable>) -> Self {
        Self {
            sink,
            config,
            lemmas,
            pending: None,
            leading: String::new(),
            carry: String::new(),
            last_slot: None,
            sentence: Counter::new(&config.sentence_level),
            phrase: Counter::new(&config.phrase_level),
            suspended: Vec::new(),
            queued: Vec::new(),
            milestones: BTreeMap::new(),
            transliterated: 0,
            report: WalkReport::default(),
        }
    }

    pub(crate) fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.report.diagnostics.push(diagnostic);
    }

    pub(crate) fn words(&self) -> usize {
        self.report.words()
    }

    /// Feeds a body text run. A run ending in a non-splitter keeps its last
    /// partial word back and prepends it to the next run.
    pub(crate) fn run(&mut self, content: &str) -> Result<(), GraphError> {
        let mut text = std::mem::take(&mut self.carry);
        text.push_str(content);
        let wrapped = text
            .chars()
            .last()
            .map_or(false, |c| self.config.segment_mode.is_non_splitter(c));
        if wrapped {
            let split = text
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map_or(0, |(i, c)| i + c.len_utf8());
            self.carry = text.split_off(split);
        }
        if text.is_empty() {
            return Ok(());
        }
        self.text(&text)
    }

    /// Processes a held-back partial word as it is.
    pub(crate) fn flush_carry(&mut self) -> Result<(), GraphError> {
        let carry = std::mem::take(&mut self.carry);
        if carry.is_empty() {
            Ok(())
        } else {
            self.text(&carry)
        }
    }

    fn text(&mut self, text: &str) -> Result<(), GraphError> {
        if matches!(self.config.language, Language::Greek) && has_latin_letters(text) {
            self.transliterated += 1;
        }
        for token in self.config.tokenize(text) {
            if token.is_punctuation() {
                self.punctuation(&token.surface())?;
                continue;
            }
            for normalized in normalize(&token, self.config) {
                for rewrite in &normalized.rewrites {
                    *self.report.rewrites.entry(rewrite.kind().to_string()).or_default() += 1;
                }
                if plain_form(&normalized.token.core).is_empty() {
                    self.punctuation(&normalized.token.surface())?;
                } else {
                    self.word(normalized)?;
                }
            }
        }
        Ok(())
    }

    fn punctuation(&mut self, text: &str) -> Result<(), GraphError> {
        if let Some(pending) = self.pending.as_mut() {
            pending.token.post.push_str(text);
        } else if let Some(slot) = self.last_slot {
            let mut post = self.sink.get_feature(slot, POST)?.unwrap_or_default();
            post.push_str(&self.config.unicode_form.apply(text));
            self.sink.set_feature(slot, POST, &post)?;
            self.end_counters_for(text)?;
        } else {
            self.leading.push_str(text);
        }
        Ok(())
    }

    fn word(&mut self, mut normalized: NormalizedToken) -> Result<(), GraphError> {
        self.flush()?;
        if !self.leading.is_empty() {
            let mut pre = std::mem::take(&mut self.leading);
            pre.push_str(&normalized.token.pre);
            normalized.token.pre = pre;
        }
        self.pending = Some(normalized);
        Ok(())
    }

    /// Writes the held-back word as a slot.
    pub(crate) fn flush(&mut self) -> Result<(), GraphError> {
        let Some(normalized) = self.pending.take() else {
            return Ok(());
        };
        let token = &normalized.token;
        self.end_counters_for(&token.pre)?;
        self.open_milestones()?;
        self.sentence.open(&mut *self.sink)?;
        self.phrase.open(&mut *self.sink)?;

        let slot = self.sink.create_slot()?;
        self.report.slots += 1;
        let form = self.config.unicode_form;
        self.sink.set_feature(slot, PRE, &form.apply(&token.pre))?;
        for format in &self.config.text_formats {
            let value = match format {
                TextFormat::Lemma => {
                    let lemma = self.config.lemmatize(&token.core, self.lemmas);
                    if let Some(lemma) = &lemma {
                        self.report.tally.record(lemma);
                    }
                    lemma
                }
                other => other.render(&token.core),
            };
            if let Some(value) = value {
                self.sink.set_feature(slot, format.feature(), &form.apply(&value))?;
            }
        }
        self.sink.set_feature(slot, POST, &form.apply(&token.post))?;

        match normalized.accent {
            AccentStatus::NotNeeded => {}
            AccentStatus::Reconstructed => self.report.accents.reconstructed += 1,
            AccentStatus::Skipped => {
                self.report.accents.skipped += 1;
                let diagnostic = Diagnostic::new(
                    DiagnosticSeverity::Hint,
                    format!("could not syllabify {:?}, left unaccented", token.core),
                )
                .with_code(diagnostics::ACCENT_RECONSTRUCTION_SKIPPED)
                .at(Location::Slot(self.report.slots));
                self.report.diagnostics.push(diagnostic);
            }
        }
        self.last_slot = Some(slot);
        self.end_counters_for(&normalized.token.post)
    }

    fn end_counters_for(&mut self, punctuation: &str) -> Result<(), GraphError> {
        if punctuation.chars().any(|c| self.config.is_sentence_end(c)) {
            self.phrase.end(&mut *self.sink)?;
            self.sentence.end(&mut *self.sink)?;
        } else if punctuation.chars().any(|c| self.config.is_phrase_end(c)) {
            self.phrase.end(&mut *self.sink)?;
        }
        Ok(())
    }

    pub(crate) fn end_counters(&mut self) -> Result<(), GraphError> {
        self.phrase.end(&mut *self.sink)?;
        self.sentence.end(&mut *self.sink)
    }

    /// Ends the milestone of `level` and starts a new one at the next slot.
    /// A held-back partial word is left alone, so it joins across the tag.
    pub(crate) fn milestone(&mut self, level: &str, features: Vec<(String, String)>) -> Result<(), GraphError> {
        self.flush()?;
        if let Some(node) = self.milestones.remove(level) {
            self.close_node(node, level)?;
        }
        self.queued.retain(|m| m.level != level);
        self.queued.push(Milestone {
            level: level.to_string(),
            features,
        });
        Ok(())
    }

    fn open_milestones(&mut self) -> Result<(), GraphError> {
        for milestone in std::mem::take(&mut self.queued) {
            let node = self.sink.create_node(&milestone.level)?;
            for (name, value) in &milestone.features {
                self.sink.set_feature(node, name, value)?;
            }
            self.milestones.insert(milestone.level, node);
        }
        Ok(())
    }

    pub(crate) fn end_milestones(&mut self) -> Result<(), GraphError> {
        for milestone in self.queued.drain(..) {
            tracing::debug!(level = %milestone.level, "milestone without text dropped");
        }
        for (level, node) in std::mem::take(&mut self.milestones) {
            self.close_node(node, &level)?;
        }
        Ok(())
    }

    /// Takes the counters out of the hierarchy while sections change.
    pub(crate) fn suspend_counters(&mut self) -> Result<(), GraphError> {
        for node in [self.phrase.node, self.sentence.node].into_iter().flatten() {
            if self.sink.is_active(node)? {
                self.sink.terminate(node)?;
                self.suspended.push(node);
            }
        }
        Ok(())
    }

    pub(crate) fn resume_counters(&mut self) -> Result<(), GraphError> {
        while let Some(node) = self.suspended.pop() {
            self.sink.resume(node)?;
        }
        Ok(())
    }

    /// A slot with every feature empty, forced into an otherwise empty node.
    pub(crate) fn placeholder(&mut self, reason: &str) -> Result<NodeId, GraphError> {
        let slot = self.sink.create_slot()?;
        self.report.slots += 1;
        self.report.placeholders += 1;
        self.sink.set_feature(slot, PRE, "")?;
        for format in &self.config.text_formats {
            self.sink.set_feature(slot, format.feature(), "")?;
        }
        self.sink.set_feature(slot, POST, "")?;
        self.last_slot = Some(slot);
        tracing::debug!(slot = self.report.slots, reason, "placeholder slot");
        self.report.diagnostics.push(
            Diagnostic::info(format!("placeholder slot for empty {}", reason))
                .with_code(diagnostics::PLACEHOLDER_SLOT)
                .at(Location::Slot(self.report.slots)),
        );
        Ok(slot)
    }

    /// Terminates `node` if it is still active, linking a placeholder first
    /// when it has no slot.
    pub(crate) fn close_node(&mut self, node: NodeId, level: &str) -> Result<(), GraphError> {
        if !self.sink.is_active(node)? {
            return Ok(());
        }
        if !self.sink.is_linked(node)? {
            self.placeholder(level)?;
        }
        self.sink.terminate(node)
    }

    /// Fails on a document without words when those are dropped.
    pub(crate) fn check_words(&self, ignore_empty: bool) -> Result<(), WalkError> {
        if ignore_empty && self.words() == 0 {
            tracing::warn!("document produced no slots, dropping it");
            return Err(WalkError::EmptyDocument);
        }
        Ok(())
    }

    /// Closes the document node and hands out the report.
    pub(crate) fn finish(mut self, document: NodeId) -> Result<WalkReport, WalkError> {
        if self.report.slots == 0 {
            self.placeholder("document")?;
        }
        let config = self.config;
        self.close_node(document, &config.document_level)?;
        if self.transliterated > 0 {
            self.report.diagnostics.push(
                Diagnostic::info(format!(
                    "{} text runs transliterated from betacode",
                    self.transliterated
                ))
                .with_code(diagnostics::TRANSLITERATED),
            );
        }
        Ok(self.report)
    }
}
