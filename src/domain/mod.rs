//! Domain types for usage-example curation.
//!
//! - Form: the word-form an example is wanted for
//! - CorpusRecord: a document or sentence row from a corpus
//! - Candidate: a sentence that matched a form, with provenance
//! - DecisionRecord: the persisted outcome for a form

pub mod candidate;
pub mod decision;
pub mod form;
pub mod record;

use thiserror::Error;

// Re-export commonly used types
pub use candidate::{word_count, Candidate, Provenance};
pub use decision::{DecisionRecord, Outcome};
pub use form::{Form, LanguageCode};
pub use record::{parse_record_date, CorpusRecord};

/// Violations of domain invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Form id is empty")]
    EmptyFormId,

    #[error("Form {0} has an empty representation")]
    EmptyRepresentation(String),
}
