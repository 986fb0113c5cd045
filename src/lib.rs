//! lexuse - usage-example mining and curation
//!
//! Finds short, clean sentences that contain a given word form in local
//! corpus tables and Wikisource, and lets an operator pick one per form.
//!
//! # Architecture
//!
//! - Sources produce candidates: segment documents into sentences, clean
//!   them, keep those that contain the form as a whole word and pass the
//!   length and character filter
//! - The aggregator queries sources in priority order and stops once enough
//!   candidates are found
//! - Every finished or declined form is appended to a decision log and
//!   never offered again
//!
//! # Modules
//!
//! - `domain`: Data structures (Form, CorpusRecord, Candidate, DecisionRecord)
//! - `extract`: Segmenter, cleaner, filter and form matcher
//! - `corpus`: Read-only SQLite corpus tables
//! - `sources`: Example sources (corpus tables, Wikisource)
//! - `core`: Aggregator, decision store and curation session
//! - `collaborators`: Form provider and uploader seams
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Curate forms from a file
//! lexuse curate --language sv --forms forms.jsonl
//!
//! # See what the sources find for a word
//! lexuse search rapport
//!
//! # Summarize the decision log
//! lexuse decisions
//! ```

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod core;
pub mod corpus;
pub mod domain;
pub mod extract;
pub mod sources;

// Re-export main types at crate root for convenience
pub use core::{CurationSession, DecisionStore, SourceAggregator};
pub use domain::{Candidate, CorpusRecord, DecisionRecord, Form, LanguageCode, Outcome};
pub use extract::{Extractor, ExtractionSettings};
pub use sources::{ExampleSource, SourceConfig};
