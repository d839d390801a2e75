//! # tfbuilder
//!
//! Converts TEI-style XML and delimited tabular sources written in historical
//! languages into a tokenized, annotated slot/node corpus.
//!
//! ## Testing
//!
//! Shared factories for unit and integration tests live in the
//! [testing module](tf::testing).

pub mod tf;
