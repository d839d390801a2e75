//! Single-document conversion

use crate::tf::diagnostics::{Diagnostic, DiagnosticSeverity};
use crate::tf::graph::{Corpus, GraphError, MemoryGraph};
use crate::tf::language::LanguageConfig;
use crate::tf::lemmatizing::{LemmaTable, LemmaTableError};
use crate::tf::lexing::lex;
use crate::tf::metadata::read_header;
use crate::tf::schema::{infer, Schema};
use crate::tf::settings::{Settings, SettingsError};
use crate::tf::tabular::{parse_table, HeaderPolicy, TabularError};
use crate::tf::walking::{walk, walk_table, WalkError, WalkOptions, WalkReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub enum ConversionError {
    Io(std::io::Error),
    Settings(SettingsError),
    LemmaTable(LemmaTableError),
    Tabular(TabularError),
    Walk(WalkError),
    Graph(GraphError),
}

impl ConversionError {
    /// The document was dropped for having no words.
    pub fn is_empty_document(&self) -> bool {
        matches!(self, ConversionError::Walk(WalkError::EmptyDocument))
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Io(err) => write!(f, "I/O error: {}", err),
            ConversionError::Settings(err) => write!(f, "{}", err),
            ConversionError::LemmaTable(err) => write!(f, "lemma table: {}", err),
            ConversionError::Tabular(err) => write!(f, "tabular input: {}", err),
            ConversionError::Walk(err) => write!(f, "{}", err),
            ConversionError::Graph(err) => write!(f, "graph error: {}", err),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Io(err) => Some(err),
            ConversionError::Settings(err) => Some(err),
            ConversionError::LemmaTable(err) => Some(err),
            ConversionError::Tabular(err) => Some(err),
            ConversionError::Walk(err) => Some(err),
            ConversionError::Graph(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::Io(err)
    }
}

impl From<SettingsError> for ConversionError {
    fn from(err: SettingsError) -> Self {
        ConversionError::Settings(err)
    }
}

impl From<LemmaTableError> for ConversionError {
    fn from(err: LemmaTableError) -> Self {
        ConversionError::LemmaTable(err)
    }
}

impl From<TabularError> for ConversionError {
    fn from(err: TabularError) -> Self {
        ConversionError::Tabular(err)
    }
}

impl From<WalkError> for ConversionError {
    fn from(err: WalkError) -> Self {
        ConversionError::Walk(err)
    }
}

impl From<GraphError> for ConversionError {
    fn from(err: GraphError) -> Self {
        ConversionError::Graph(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Xml,
    Tabular,
}

impl SourceKind {
    /// `.csv`, `.tsv` and `.tab` files are tabular, everything else XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ["csv", "tsv", "tab"].contains(&ext.to_ascii_lowercase().as_str()) => {
                SourceKind::Tabular
            }
            _ => SourceKind::Xml,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: String,
    pub kind: SourceKind,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, kind: SourceKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
        }
    }

    pub fn xml(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, SourceKind::Xml, text)
    }

    pub fn tabular(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, SourceKind::Tabular, text)
    }

    /// Reads a whole file; the id is the file stem.
    pub fn read(path: &Path) -> Result<Self, ConversionError> {
        let text = std::fs::read_to_string(path)?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(id, SourceKind::from_path(path), text))
    }
}

/// A converted document.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub id: String,
    pub corpus: Corpus,
    /// Inferred schema, XML input only.
    pub schema: Option<Schema>,
    /// Walk report; its diagnostics include those of lexing and inference.
    pub report: WalkReport,
}

#[derive(Debug, Clone)]
pub struct Converter {
    pub config: LanguageConfig,
    pub lemmas: Option<Arc<LemmaTable>>,
    pub ignore_empty: bool,
    pub header: HeaderPolicy,
    pub delimiter: Option<char>,
}

impl Converter {
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            config,
            lemmas: None,
            ignore_empty: true,
            header: HeaderPolicy::Detect,
            delimiter: None,
        }
    }

    pub fn with_lemmas(mut self, lemmas: LemmaTable) -> Self {
        self.lemmas = Some(Arc::new(lemmas));
        self
    }

    pub fn with_ignore_empty(mut self, ignore_empty: bool) -> Self {
        self.ignore_empty = ignore_empty;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConversionError> {
        let mut converter = Self::new(settings.language_config()?).with_ignore_empty(settings.ignore_empty);
        if let Some(path) = &settings.lemma_table {
            let table = LemmaTable::load(path)?;
            tracing::info!(forms = table.len(), path = %path.display(), "loaded lemma table");
            converter = converter.with_lemmas(table);
        }
        converter.header = settings.tabular.header_policy();
        converter.delimiter = settings.tabular.delimiter();
        Ok(converter)
    }

    fn meta(&self, id: &str, header: BTreeMap<String, String>, report: &WalkReport) -> BTreeMap<String, String> {
        let mut meta = header;
        meta.insert("id".to_string(), id.to_string());
        meta.insert("language".to_string(), self.config.language.name().to_string());
        for format in &self.config.text_formats {
            meta.insert(format.otext_name().to_string(), format.template());
        }
        if report.tally.total() > 0 {
            meta.insert(
                "lemma_coverage".to_string(),
                format!("{:.2}%", report.tally.ratio() * 100.0),
            );
        }
        meta
    }

    pub fn convert(&self, document: &SourceDocument) -> Result<Conversion, ConversionError> {
        let span = tracing::info_span!("convert", id = %document.id);
        let _enter = span.enter();

        let mut graph = MemoryGraph::new(self.config.slot_type.clone());
        let lemmas = self.lemmas.as_deref();
        let (header, schema, mut report, mut diagnostics) = match document.kind {
            SourceKind::Xml => {
                let lexed = lex(&document.text, &self.config);
                let header = read_header(&lexed.items, &self.config.header_fields);
                let schema = infer(&lexed.items, &self.config.schema_keys);
                let name = header.get("title").cloned().unwrap_or_else(|| document.id.clone());
                let options = WalkOptions::new(name).with_ignore_empty(self.ignore_empty);
                let report = walk(&lexed.items, &schema, &self.config, lemmas, &options, &mut graph)?;
                let mut diagnostics = lexed.diagnostics;
                diagnostics.extend(schema.diagnostics.iter().cloned());
                (header, Some(schema), report, diagnostics)
            }
            SourceKind::Tabular => {
                let table = parse_table(&document.text, &self.header, self.delimiter)?;
                let options = WalkOptions::new(document.id.clone()).with_ignore_empty(self.ignore_empty);
                let report = walk_table(&table, &self.config, lemmas, &options, &mut graph)?;
                (BTreeMap::new(), None, report, table.diagnostics)
            }
        };
        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;
        log_diagnostics(&report.diagnostics);

        let meta = self.meta(&document.id, header, &report);
        let corpus = graph.finish(meta)?;
        tracing::info!(
            slots = report.slots,
            placeholders = report.placeholders,
            diagnostics = report.diagnostics.len(),
            "converted document"
        );
        Ok(Conversion {
            id: document.id.clone(),
            corpus,
            schema,
            report,
        })
    }
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            DiagnosticSeverity::Error | DiagnosticSeverity::Warning => tracing::warn!("{}", diagnostic),
            DiagnosticSeverity::Information | DiagnosticSeverity::Hint => tracing::debug!("{}", diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tf::diagnostics;
    use crate::tf::lemmatizing::LemmaEntry;

    #[test]
    fn test_convert_xml_with_header() {
        let converter = Converter::new(LanguageConfig::generic());
        let source = SourceDocument::xml(
            "ilias",
            "<teiHeader><titleStmt><title>Ilias</title></titleStmt></teiHeader>\
             <text><body><div n=\"1\"><p>wrath sing.</p></div></body></text>",
        );
        let conversion = converter.convert(&source).expect("conversion");
        let corpus = &conversion.corpus;
        assert_eq!(corpus.slot_count(), 2);
        assert_eq!(corpus.meta["title"], "Ilias");
        assert_eq!(corpus.meta["language"], "generic");
        let book = corpus.nodes_of("_book").next().expect("document node");
        assert_eq!(book.features["_book"], "Ilias");
        assert_eq!(conversion.schema.as_ref().map(|s| s.levels.clone()), Some(vec!["div".to_string()]));
    }

    #[test]
    fn test_lexer_diagnostics_are_kept() {
        let converter = Converter::new(LanguageConfig::generic());
        let source = SourceDocument::xml("d", "<body><div n='1\"><p>a</p></div></body>");
        let conversion = converter.convert(&source).expect("conversion");
        assert_eq!(
            diagnostics::count_code(&conversion.report.diagnostics, diagnostics::ATTRIBUTE_QUOTING_REPAIRED),
            1
        );
    }

    #[test]
    fn test_lemma_coverage_in_meta() {
        let table = LemmaTable::from_entries(vec![LemmaEntry::new("λόγος", "λόγος")]);
        let converter = Converter::new(crate::tf::testing::greek_config()).with_lemmas(table);
        let source = SourceDocument::xml("d", "<body><p>λόγος ἄγνωστον</p></body>");
        let conversion = converter.convert(&source).expect("conversion");
        assert_eq!(conversion.report.tally.found, 1);
        assert_eq!(conversion.report.tally.missed, 1);
        assert_eq!(conversion.corpus.meta["lemma_coverage"], "50.00%");
    }

    #[test]
    fn test_convert_tabular() {
        let converter = Converter::new(LanguageConfig::generic());
        let source = SourceDocument::tabular("t", "book\tline\ttext\n1\t1\tone two\n1\t2\tthree\n");
        let conversion = converter.convert(&source).expect("conversion");
        assert_eq!(conversion.corpus.slot_count(), 3);
        assert_eq!(conversion.corpus.nodes_of("line").count(), 2);
        assert!(conversion.schema.is_none());
    }

    #[test]
    fn test_empty_document_is_dropped() {
        let converter = Converter::new(LanguageConfig::generic());
        let err = converter
            .convert(&SourceDocument::xml("e", "<body></body>"))
            .unwrap_err();
        assert!(err.is_empty_document());
    }

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/b.TSV")), SourceKind::Tabular);
        assert_eq!(SourceKind::from_path(Path::new("a/b.xml")), SourceKind::Xml);
    }
}
