//! Tabular sources converted through configured settings

use std::io::Write;
use tfbuilder::tf::diagnostics;
use tfbuilder::tf::pipeline::{Converter, SourceDocument};
use tfbuilder::tf::settings::Loader;
use tfbuilder::tf::tabular::{parse_table, HeaderPolicy};

fn converter_with(toml: &str) -> Converter {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(toml.as_bytes()).expect("write settings");
    let settings = Loader::new()
        .with_file(file.path())
        .build()
        .expect("settings");
    Converter::from_settings(&settings).expect("converter")
}

#[test]
fn test_named_columns_without_header() {
    let converter = converter_with(
        "language = \"generic\"\n[tabular]\nheader = \"absent\"\ndelimiter = \",\"\ncolumns = [\"book\", \"verse\"]\n",
    );
    let source = SourceDocument::tabular(
        "gen",
        "1,1,\"In the beginning, God\"\n1,2,created the heaven\n2,1,and the earth.\n",
    );
    let conversion = converter.convert(&source).expect("conversion");
    let corpus = &conversion.corpus;
    assert_eq!(corpus.slot_count(), 9);
    let verses: Vec<(&str, usize)> = corpus
        .nodes_of("verse")
        .map(|n| (n.features["verse"].as_str(), n.slots.len()))
        .collect();
    assert_eq!(verses, vec![("1", 4), ("2", 3), ("1", 2)]);
    assert_eq!(corpus.nodes_of("book").count(), 2);
    assert_eq!(corpus.slot_values("post")[3], " ");
}

#[test]
fn test_detected_header_names_levels() {
    let converter = converter_with("language = \"generic\"\n");
    let source = SourceDocument::tabular("t", "chapter\ttext\n1\tone\n2\ttwo\n");
    let conversion = converter.convert(&source).expect("conversion");
    assert_eq!(conversion.corpus.nodes_of("chapter").count(), 2);
    assert_eq!(
        diagnostics::count_code(&conversion.report.diagnostics, diagnostics::TABULAR_HEADER_DETECTED),
        1
    );
}

#[test]
fn test_sentences_run_across_rows() {
    let table = parse_table("1\tHe said\n2\tnothing. Then\n3\twent\n", &HeaderPolicy::Detect, None)
        .expect("table");
    assert_eq!(table.columns, vec!["level1"]);
    let converter = Converter::new(tfbuilder::tf::language::LanguageConfig::generic());
    let conversion = converter
        .convert(&SourceDocument::tabular(
            "t",
            "1\tHe said\n2\tnothing. Then\n3\twent\n",
        ))
        .expect("conversion");
    let sentences: Vec<&Vec<usize>> = conversion
        .corpus
        .nodes_of("_sentence")
        .map(|n| &n.slots)
        .collect();
    assert_eq!(sentences, vec![&vec![1, 2, 3], &vec![4, 5]]);
}
