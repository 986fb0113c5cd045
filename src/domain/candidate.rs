//! Usage-example candidates produced by the extraction pipeline.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::record::CorpusRecord;

/// Where a candidate sentence came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the source that produced the candidate (e.g. "riksdagen")
    pub source: String,

    /// Record identifier within that source
    pub record_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Title of the document (network sources)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,

    /// Human-readable URL of the document, if the source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Provenance {
    /// Provenance pointing at a corpus record
    pub fn from_record(source: impl Into<String>, record: &CorpusRecord) -> Self {
        Self {
            source: source.into(),
            record_id: record.id.clone(),
            external_id: record.external_id.clone(),
            date: record.date,
            filename: record.filename.clone(),
            document_title: None,
            url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A cleaned, filtered sentence believed to exemplify a form.
///
/// Candidates live for one session only and are never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Cleaned sentence text
    pub text: String,

    /// Whitespace-delimited token count of `text`
    pub word_count: usize,

    /// Identifier of the form the sentence matched
    pub form_id: String,

    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(text: impl Into<String>, form_id: impl Into<String>, provenance: Provenance) -> Self {
        let text = text.into();
        Self {
            word_count: word_count(&text),
            text,
            form_id: form_id.into(),
            provenance,
        }
    }

    /// Deterministic content id: first 12 hex chars of SHA256(text)
    pub fn content_id(&self) -> String {
        let digest = Sha256::digest(self.text.as_bytes());
        hex::encode(digest)[..12].to_string()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (from {} at {})",
            self.text, self.provenance.record_id, self.provenance.source
        )
    }
}

/// Number of whitespace-delimited tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance() -> Provenance {
        Provenance::from_record("riksdagen", &CorpusRecord::new("H801", "irrelevant"))
    }

    #[test]
    fn test_word_count_derived() {
        let candidate = Candidate::new(
            "Hon skrev en lång rapport om klimatet idag.",
            "L1-F1",
            provenance(),
        );
        assert_eq!(candidate.word_count, 8);
    }

    #[test]
    fn test_content_id_deterministic() {
        let a = Candidate::new("Samma mening här.", "L1-F1", provenance());
        let b = Candidate::new("Samma mening här.", "L2-F9", provenance());
        assert_eq!(a.content_id(), b.content_id());
        assert_eq!(a.content_id().len(), 12);

        let c = Candidate::new("En annan mening här.", "L1-F1", provenance());
        assert_ne!(a.content_id(), c.content_id());
    }

    #[test]
    fn test_display_mentions_source() {
        let candidate = Candidate::new("Det regnar i dag.", "L1-F1", provenance());
        assert_eq!(
            candidate.to_string(),
            "Det regnar i dag. (from H801 at riksdagen)"
        );
    }
}
