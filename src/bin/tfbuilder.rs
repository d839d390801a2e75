//! Command-line interface for tfbuilder
//! Converts TEI-style XML and tabular sources into slot/node corpora and exposes the
//! individual stages for inspection.
//!
//! Usage:
//!   tfbuilder convert `<files>`... --out `<dir>`   - Convert documents, one JSON corpus each
//!   tfbuilder lex `<file>`                        - Print the lexed item stream as JSON
//!   tfbuilder schema `<file>`                     - Print the inferred schema as JSON
//!   tfbuilder segment `<text>`                    - Print the (pre, core, post) triples of a text
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tfbuilder::tf::lexing::lex;
use tfbuilder::tf::pipeline::{Batch, Conversion, ConversionError, Converter, SourceDocument};
use tfbuilder::tf::schema::infer;
use tfbuilder::tf::settings::{Loader, Settings, SettingsError};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("tfbuilder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds annotated slot/node corpora from TEI-style XML and tabular sources")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML settings file layered over the defaults"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .short('l')
                .global(true)
                .help("Language configuration (greek, latin, generic)"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .global(true)
                .action(ArgAction::Append)
                .help("Override a setting, e.g. --set tabular.header=absent"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert source documents into JSON corpora")
                .arg(
                    Arg::new("files")
                        .help("XML, CSV or TSV source files")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output directory")
                        .default_value("."),
                )
                .arg(
                    Arg::new("lemmas")
                        .long("lemmas")
                        .help("Lemma table (TSV or JSON)"),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .short('j')
                        .value_parser(clap::value_parser!(u32))
                        .help("Worker threads, 0 for one per core"),
                )
                .arg(
                    Arg::new("keep-empty")
                        .long("keep-empty")
                        .action(ArgAction::SetTrue)
                        .help("Keep documents without words as a placeholder slot"),
                ),
        )
        .subcommand(
            Command::new("lex")
                .about("Print the lexed item stream")
                .arg(Arg::new("path").help("Source XML file").required(true).index(1)),
        )
        .subcommand(
            Command::new("schema")
                .about("Print the inferred section schema")
                .arg(Arg::new("path").help("Source XML file").required(true).index(1)),
        )
        .subcommand(
            Command::new("segment")
                .about("Print the word triples of a text")
                .arg(Arg::new("text").help("Text to segment").required(true).index(1)),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("convert", convert_matches)) => handle_convert_command(convert_matches),
        Some(("lex", lex_matches)) => handle_lex_command(lex_matches),
        Some(("schema", schema_matches)) => handle_schema_command(schema_matches),
        Some(("segment", segment_matches)) => handle_segment_command(segment_matches),
        _ => unreachable!(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the `--config` file, then the command line.
fn load_settings(matches: &ArgMatches) -> Result<Settings, SettingsError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(lang) = matches.get_one::<String>("lang") {
        loader = loader.set_override("language", lang.as_str())?;
    }
    if let Some(lemmas) = matches.try_get_one::<String>("lemmas").ok().flatten() {
        loader = loader.set_override("lemma_table", lemmas.as_str())?;
    }
    if let Some(jobs) = matches.try_get_one::<u32>("jobs").ok().flatten() {
        loader = loader.set_override("jobs", i64::from(*jobs))?;
    }
    if matches.try_get_one::<bool>("keep-empty").ok().flatten() == Some(&true) {
        loader = loader.set_override("ignore_empty", false)?;
    }
    for assignment in matches.get_many::<String>("set").into_iter().flatten() {
        loader = loader.set_assignment(assignment)?;
    }
    loader.build()
}

fn read_source(path: &str) -> Result<String, ConversionError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Writes next to the target and renames, so a crash never leaves half a corpus.
fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".partial");
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, contents)?;
    std::fs::rename(&temp, path)
}

fn commit(out: &Path, conversion: &Conversion) -> Result<(), ConversionError> {
    let json = serde_json::to_string_pretty(&conversion.corpus)
        .map_err(|e| ConversionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    write_atomically(&out.join(format!("{}.json", conversion.id)), &json)?;
    Ok(())
}

/// Handle the convert command
fn handle_convert_command(matches: &ArgMatches) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = load_settings(matches)?;
    let out = PathBuf::from(matches.get_one::<String>("out").map(String::as_str).unwrap_or("."));
    std::fs::create_dir_all(&out)?;

    let mut documents = Vec::new();
    let mut unreadable = 0;
    for path in matches.get_many::<String>("files").into_iter().flatten() {
        match SourceDocument::read(Path::new(path)) {
            Ok(document) => documents.push(document),
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                unreadable += 1;
            }
        }
    }

    let batch = Batch::new(Converter::from_settings(&settings)?, settings.jobs);
    let report = batch.run(&documents, |conversion| commit(&out, conversion))?;

    for failure in &report.failures {
        eprintln!("Error converting {}: {}", failure.id, failure.error);
    }
    println!(
        "converted {} of {} documents ({} dropped, {} failed), lemma coverage {:.2}%",
        report.succeeded,
        report.attempted + unreadable,
        report.dropped.len(),
        report.failures.len() + unreadable,
        report.coverage() * 100.0
    );
    Ok(if report.is_success() && unreadable == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Handle the lex command
fn handle_lex_command(matches: &ArgMatches) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = load_settings(matches)?;
    let config = settings.language_config()?;
    let path = matches.get_one::<String>("path").map(String::as_str).unwrap_or_default();
    let output = lex(&read_source(path)?, &config);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

/// Handle the schema command
fn handle_schema_command(matches: &ArgMatches) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = load_settings(matches)?;
    let config = settings.language_config()?;
    let path = matches.get_one::<String>("path").map(String::as_str).unwrap_or_default();
    let items = lex(&read_source(path)?, &config).items;
    let schema = infer(&items, &config.schema_keys);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(ExitCode::SUCCESS)
}

/// Handle the segment command
fn handle_segment_command(matches: &ArgMatches) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = load_settings(matches)?;
    let config = settings.language_config()?;
    let text = matches.get_one::<String>("text").map(String::as_str).unwrap_or_default();
    for token in config.tokenize(text) {
        println!("{}", token);
    }
    Ok(ExitCode::SUCCESS)
}
