//! Local corpus tables.
//!
//! Corpora (parliamentary records, historical job ads) are converted
//! offline into SQLite tables of pre-segmented sentences. This module reads
//! them.

pub mod table;

pub use table::{CorpusError, CorpusTable, ScanStats, TableSearch};
