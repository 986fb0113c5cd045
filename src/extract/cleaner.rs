//! Sentence normalization: headings, decorative lead-ins, whitespace.
//!
//! `clean` is idempotent. Stripping a bullet can expose a heading (and the
//! other way around), so the strip steps run until nothing changes.

use lazy_static::lazy_static;
use regex::Regex;

/// Document-structure labels seen at the start of job-ad sentences
const DEFAULT_HEADINGS: &[&str] = &[
    // Swedish
    "ARBETSUPPGIFTER",
    "KVALIFIKATIONER",
    "ÖVRIG INFORMATION",
    "ÖVRIGT",
    "Villkor",
    "Kvalifikationer",
    "Beskrivning",
    "Om oss",
    "Arbetsmiljö",
    "Vi erbjuder:",
    "Övrigt",
    "Ansökan",
    "Placering:",
    "Lön:",
    "OM TJÄNSTEN",
    "OM OSS",
    "KONTAKT",
    "VEM ÄR DU",
    "Start:",
    "OM DIG",
    "OM JOBBET",
    "Om arbetet",
    // English
    "REQUIREMENTS",
    "RESPONSIBILITIES",
    "QUALIFICATIONS",
    "ABOUT US",
    "ABOUT THE JOB",
    "ABOUT YOU",
    "WE OFFER",
    "Salary:",
    "Location:",
];

/// Decorative characters stripped from the start of a sentence
const LEAD_IN_CHARS: &[char] = &[
    '·', '•', '-', '.', '*', '+', '–', '—', '_', '\'', '"', '„', '“', ':', '…',
];

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(r" {2,}").unwrap();
}

/// Normalizes raw sentences before filtering and matching
#[derive(Debug, Clone)]
pub struct SentenceCleaner {
    /// Sorted longest first so "OM OSS" wins over a shorter prefix
    headings: Vec<String>,
}

impl Default for SentenceCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceCleaner {
    /// Cleaner with the built-in heading list
    pub fn new() -> Self {
        Self::with_headings(std::iter::empty::<String>())
    }

    /// Cleaner with the built-in headings plus `extra`
    pub fn with_headings(extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut headings: Vec<String> = DEFAULT_HEADINGS.iter().map(|h| h.to_string()).collect();
        headings.extend(
            extra
                .into_iter()
                .map(Into::into)
                .filter(|h: &String| !h.trim().is_empty()),
        );
        headings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        headings.dedup();
        Self { headings }
    }

    /// Normalize a sentence. Never fails; clean input passes through unchanged.
    pub fn clean(&self, sentence: &str) -> String {
        let mut current = collapse_spaces(sentence.trim());
        loop {
            let next = self.strip_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn strip_once(&self, sentence: &str) -> String {
        let mut out = self.strip_heading(sentence).trim();

        if let Some(first) = out.chars().next() {
            if LEAD_IN_CHARS.contains(&first) {
                out = out.trim_start_matches(first).trim();
            }
        }

        collapse_spaces(out)
    }

    fn strip_heading<'a>(&self, sentence: &'a str) -> &'a str {
        for heading in &self.headings {
            if let Some(rest) = sentence.strip_prefix(heading.as_str()) {
                // Only a whole label counts: "Beskrivningen" keeps its prefix
                let ends_word = heading.ends_with(|c: char| !c.is_alphanumeric())
                    || !rest.starts_with(char::is_alphanumeric);
                if ends_word {
                    return rest;
                }
            }
        }
        sentence
    }
}

fn collapse_spaces(text: &str) -> String {
    SPACE_RUNS.replace_all(text, " ").into_owned()
}
