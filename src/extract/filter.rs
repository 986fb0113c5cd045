//! Admissibility rules for cleaned sentences.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::word_count;

lazy_static! {
    static ref FORBIDDEN_CHARS: Regex = Regex::new(r"\d|[()§\[\]/]").unwrap();
    static ref SITE_SUFFIX: Regex = Regex::new(r"\.(?:se|nu|com|org|net)\b").unwrap();
}

/// Exclusive word-count bounds: admissible iff `min < count < max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for WordBounds {
    fn default() -> Self {
        Self { min: 5, max: 15 }
    }
}

/// Why a sentence was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    TooShort,
    TooLong,
    ForbiddenCharacter,
    LeadingComma,
    LowercaseStart,
    Url,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rejection::TooShort => "too short",
            Rejection::TooLong => "too long",
            Rejection::ForbiddenCharacter => "forbidden character",
            Rejection::LeadingComma => "leading comma",
            Rejection::LowercaseStart => "lowercase start",
            Rejection::Url => "url",
        };
        f.write_str(label)
    }
}

/// Heuristic filter: word-count bounds plus structural checks
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateFilter {
    bounds: WordBounds,
}

impl CandidateFilter {
    pub fn new(bounds: WordBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> WordBounds {
        self.bounds
    }

    pub fn is_admissible(&self, sentence: &str) -> bool {
        self.check(sentence).is_ok()
    }

    /// First rule the sentence breaks, if any
    pub fn check(&self, sentence: &str) -> Result<(), Rejection> {
        let count = word_count(sentence);
        if count <= self.bounds.min {
            return Err(Rejection::TooShort);
        }
        if count >= self.bounds.max {
            return Err(Rejection::TooLong);
        }

        if FORBIDDEN_CHARS.is_match(sentence) {
            return Err(Rejection::ForbiddenCharacter);
        }

        match sentence.chars().next() {
            Some(',') => return Err(Rejection::LeadingComma),
            Some(c) if c.is_lowercase() => return Err(Rejection::LowercaseStart),
            _ => {}
        }

        if sentence.contains("http") || SITE_SUFFIX.is_match(sentence) {
            return Err(Rejection::Url);
        }

        Ok(())
    }
}

/// Per-reason rejection counts for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub admitted: usize,
    pub rejected: HashMap<Rejection, usize>,
}

impl FilterStats {
    pub fn record(&mut self, result: Result<(), Rejection>) {
        match result {
            Ok(()) => self.admitted += 1,
            Err(reason) => *self.rejected.entry(reason).or_insert(0) += 1,
        }
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn merge(&mut self, other: &FilterStats) {
        self.admitted += other.admitted;
        for (reason, count) in &other.rejected {
            *self.rejected.entry(*reason).or_insert(0) += count;
        }
    }
}
