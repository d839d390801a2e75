//! Per-document conversion and batch dispatch
//!
//!     [`convert::Converter`] runs one source document through the whole
//!     chain and returns the finished corpus with its report. Documents share
//!     nothing mutable, so [`batch::Batch`] spreads them over a bounded
//!     worker pool. A failing document is recorded with its id and never
//!     stops the batch.

pub mod batch;
pub mod convert;

pub use batch::{Batch, BatchError, BatchFailure, BatchReport};
pub use convert::{Conversion, ConversionError, Converter, SourceDocument, SourceKind};
