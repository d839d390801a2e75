//! Main module for tfbuilder library functionality
//!
//!     A source document flows through the components leaf-first:
//!
//!         raw text -> lexing -> schema (one pass) -> walking -> graph sink
//!
//!     Text runs met by the walker go through segmenting, normalizing and
//!     lemmatizing before they become slot features. Everything that is
//!     language specific lives in a [language::LanguageConfig] built once
//!     and shared read-only across documents.

pub mod diagnostics;
pub mod graph;
pub mod language;
pub mod lemmatizing;
pub mod lexing;
pub mod metadata;
pub mod normalizing;
pub mod pipeline;
pub mod schema;
pub mod segmenting;
pub mod settings;
pub mod tabular;
pub mod testing;
pub mod walking;
