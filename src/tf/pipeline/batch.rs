//! Parallel batch conversion
//!
//!     Each document is converted on a worker of a private rayon pool and
//!     handed to the caller's commit closure as soon as it is done. The
//!     closure runs on the worker thread, so it must be `Sync`; writing the
//!     output file is its business, not the batch's.

use super::convert::{Conversion, ConversionError, Converter, SourceDocument};
use crate::tf::lemmatizing::LemmaTally;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum BatchError {
    Pool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Pool(err) => write!(f, "cannot start worker pool: {}", err),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Pool(err) => Some(err),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for BatchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        BatchError::Pool(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Documents left out for having no words.
    pub dropped: Vec<String>,
    pub failures: Vec<BatchFailure>,
    pub tally: LemmaTally,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Lemma coverage over every converted document.
    pub fn coverage(&self) -> f64 {
        self.tally.ratio()
    }
}

enum Outcome {
    Done(LemmaTally),
    Dropped(String),
    Failed(BatchFailure),
}

pub struct Batch {
    converter: Converter,
    jobs: usize,
}

impl Batch {
    /// `jobs == 0` lets rayon pick one worker per core.
    pub fn new(converter: Converter, jobs: usize) -> Self {
        Self { converter, jobs }
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn run<F>(&self, documents: &[SourceDocument], commit: F) -> Result<BatchReport, BatchError>
    where
        F: Fn(&Conversion) -> Result<(), ConversionError> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build()?;
        tracing::info!(
            documents = documents.len(),
            workers = pool.current_num_threads(),
            "starting batch"
        );

        let outcomes: Vec<Outcome> = pool.install(|| {
            documents
                .par_iter()
                .map(|document| self.one(document, &commit))
                .collect()
        });

        let mut report = BatchReport {
            attempted: documents.len(),
            ..BatchReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Done(tally) => {
                    report.succeeded += 1;
                    report.tally.merge(&tally);
                }
                Outcome::Dropped(id) => report.dropped.push(id),
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }
        tracing::info!(
            succeeded = report.succeeded,
            dropped = report.dropped.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }

    fn one<F>(&self, document: &SourceDocument, commit: &F) -> Outcome
    where
        F: Fn(&Conversion) -> Result<(), ConversionError>,
    {
        let result = self
            .converter
            .convert(document)
            .and_then(|conversion| commit(&conversion).map(|_| conversion.report.tally));
        match result {
            Ok(tally) => Outcome::Done(tally),
            Err(err) if err.is_empty_document() => {
                tracing::info!(id = %document.id, "dropped document without words");
                Outcome::Dropped(document.id.clone())
            }
            Err(err) => {
                tracing::error!(id = %document.id, error = %err, "conversion failed");
                Outcome::Failed(BatchFailure {
                    id: document.id.clone(),
                    error: err.to_string(),
                })
            }
        }
    }
}
