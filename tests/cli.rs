//! Command-line behaviour of the tfbuilder binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const DOCUMENT: &str = r#"<TEI><teiHeader><titleStmt><title>Sample</title></titleStmt></teiHeader>
<text><body><div n="1"><p>Arma virumque cano.</p></div><div n="2"><p>Troiae qui primus</p></div></body></text></TEI>"#;

fn tfbuilder() -> Command {
    let mut cmd = Command::cargo_bin("tfbuilder").expect("binary");
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_convert_writes_one_corpus_per_document() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("aeneid.xml");
    fs::write(&source, DOCUMENT).expect("write source");
    let out = dir.path().join("out");

    tfbuilder()
        .args(["--lang", "latin", "convert"])
        .arg(&source)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("converted 1 of 1 documents"));

    let written = fs::read_to_string(out.join("aeneid.json")).expect("corpus file");
    let corpus: serde_json::Value = serde_json::from_str(&written).expect("json");
    assert_eq!(corpus["meta"]["title"], "Sample");
    assert_eq!(corpus["slots"].as_array().map(Vec::len), Some(6));
    assert!(!out.join("aeneid.json.partial").exists());
}

#[test]
fn test_failed_document_sets_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let good = dir.path().join("good.xml");
    fs::write(&good, DOCUMENT).expect("write source");
    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "\n").expect("write source");

    tfbuilder()
        .arg("convert")
        .arg(&good)
        .arg(&bad)
        .arg("--out")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad"))
        .stdout(predicate::str::contains("converted 1 of 2 documents"));
    assert!(dir.path().join("good.json").exists());
}

#[test]
fn test_keep_empty_writes_placeholder_corpus() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("empty.xml");
    fs::write(&source, "<body><div n=\"1\"></div></body>").expect("write source");

    tfbuilder()
        .arg("convert")
        .arg(&source)
        .args(["--keep-empty", "--out"])
        .arg(dir.path())
        .assert()
        .success();
    assert!(dir.path().join("empty.json").exists());

    tfbuilder()
        .arg("convert")
        .arg(&source)
        .arg("--out")
        .arg(dir.path().join("dropped"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 dropped"));
    assert!(!dir.path().join("dropped").join("empty.json").exists());
}

#[test]
fn test_schema_prints_levels() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("doc.xml");
    fs::write(&source, DOCUMENT).expect("write source");

    tfbuilder()
        .arg("schema")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"levels\"").and(predicate::str::contains("\"div\"")));
}

#[test]
fn test_lex_prints_items() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("doc.xml");
    fs::write(&source, "<p>a &amp; b</p>").expect("write source");

    tfbuilder()
        .arg("lex")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("a & b"));
}

#[test]
fn test_segment_prints_triples() {
    tfbuilder()
        .args(["--lang", "generic", "segment", "Arma, virumque"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"("", "Arma", ", ")"#));
}

#[test]
fn test_bad_override_is_reported() {
    tfbuilder()
        .args(["--set", "nonsense", "segment", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonsense"));
}

#[test]
fn test_unknown_language_is_reported() {
    tfbuilder()
        .args(["--lang", "klingon", "segment", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("klingon"));
}
