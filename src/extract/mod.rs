//! Candidate extraction pipeline.
//!
//! Raw record text flows through four stages:
//!
//! 1. `SentenceSegmenter` splits it into unique sentence strings
//! 2. `SentenceCleaner` strips headings and lead-in decoration
//! 3. `FormMatcher` keeps sentences containing the form as a whole token
//! 4. `CandidateFilter` applies word-count and structural rules
//!
//! Every stage is deterministic, so the same record and form always yield
//! the same candidates.

pub mod cleaner;
pub mod detector;
pub mod filter;
pub mod matcher;
pub mod segmenter;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candidate, CorpusRecord, Form, LanguageCode, Provenance};

// Re-export commonly used types
pub use cleaner::SentenceCleaner;
pub use detector::{PunctuationDetector, SentenceDetector};
pub use filter::{CandidateFilter, FilterStats, Rejection, WordBounds};
pub use matcher::FormMatcher;
pub use segmenter::{Segments, SentenceSegmenter, DEFAULT_MAX_CHUNK_CHARS};

/// Extraction settings (the `extraction` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Sentences need more than this many words
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Sentences need fewer than this many words
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Texts longer than this are cut before segmentation
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Heading labels stripped in addition to the built-in list
    #[serde(default)]
    pub extra_headings: Vec<String>,

    /// Abbreviations that never end a sentence, on top of the language list
    #[serde(default)]
    pub extra_abbreviations: Vec<String>,
}

fn default_min_words() -> usize {
    5
}

fn default_max_words() -> usize {
    15
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_words: default_max_words(),
            max_chunk_chars: default_max_chunk_chars(),
            extra_headings: Vec::new(),
            extra_abbreviations: Vec::new(),
        }
    }
}

impl ExtractionSettings {
    pub fn bounds(&self) -> WordBounds {
        WordBounds {
            min: self.min_words,
            max: self.max_words,
        }
    }
}

/// Result of running the pipeline over one record
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,

    /// Filter outcomes for sentences that contained the form
    pub stats: FilterStats,

    /// Sentences that did not contain the form
    pub unmatched: usize,
}

/// Segment, clean, match and filter corpus text for a form
#[derive(Clone)]
pub struct Extractor {
    segmenter: SentenceSegmenter,
    cleaner: SentenceCleaner,
    matcher: FormMatcher,
    filter: CandidateFilter,
}

impl Extractor {
    pub fn new(settings: &ExtractionSettings, detector: Arc<dyn SentenceDetector>) -> Self {
        Self {
            segmenter: SentenceSegmenter::new(detector)
                .with_max_chunk_chars(settings.max_chunk_chars),
            cleaner: SentenceCleaner::with_headings(settings.extra_headings.iter().cloned()),
            matcher: FormMatcher::new(),
            filter: CandidateFilter::new(settings.bounds()),
        }
    }

    /// Extractor using the bundled punctuation detector for `language`
    pub fn for_language(settings: &ExtractionSettings, language: &LanguageCode) -> Self {
        let detector = PunctuationDetector::for_language(language)
            .with_abbreviations(settings.extra_abbreviations.iter().cloned());
        Self::new(settings, Arc::new(detector))
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Candidates for `form` found in `record`, attributed to `source`
    pub fn extract(&self, record: &CorpusRecord, form: &Form, source: &str) -> Extraction {
        self.extract_with(record, form, || Provenance::from_record(source, record))
    }

    /// Like `extract`, with caller-built provenance (e.g. a document title or URL)
    pub fn extract_with<F>(&self, record: &CorpusRecord, form: &Form, provenance: F) -> Extraction
    where
        F: Fn() -> Provenance,
    {
        let mut extraction = Extraction::default();
        let mut seen = HashSet::new();

        for raw in &self.segmenter.segment(&record.text) {
            let sentence = self.cleaner.clean(raw);
            if sentence.is_empty() || !seen.insert(sentence.clone()) {
                continue;
            }

            if !self.matcher.matches(&sentence, &form.representation) {
                extraction.unmatched += 1;
                continue;
            }

            let verdict = self.filter.check(&sentence);
            extraction.stats.record(verdict);
            if verdict.is_ok() {
                extraction
                    .candidates
                    .push(Candidate::new(sentence, form.id.clone(), provenance()));
            }
        }

        debug!(
            record = %record.id,
            form = %form.id,
            candidates = extraction.candidates.len(),
            rejected = extraction.stats.total_rejected(),
            "Extracted candidates"
        );

        extraction
    }
}
