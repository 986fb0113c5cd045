//! Split raw corpus text into candidate sentence strings.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::detector::SentenceDetector;

/// Texts longer than this (in chars) are cut before detection
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 95_000;

/// Cut character for oversized texts. Sentences containing it are
/// rejected by the filter anyway, so a cut rarely loses a usable sentence.
pub const DEFAULT_CUT_CHAR: char = '1';

lazy_static! {
    // Delimiters that show the detector missed a real boundary
    static ref FALLBACK_DELIMITERS: Regex = Regex::new(r"\n|\r|\*| - | {3,}|•").unwrap();
}

/// Sentence segmenter wrapping an opaque boundary detector
#[derive(Clone)]
pub struct SentenceSegmenter {
    detector: Arc<dyn SentenceDetector>,
    max_chunk_chars: usize,
    cut_char: char,
}

impl SentenceSegmenter {
    pub fn new(detector: Arc<dyn SentenceDetector>) -> Self {
        Self {
            detector,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            cut_char: DEFAULT_CUT_CHAR,
        }
    }

    /// Override the oversize limit
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    /// Override the cut character used for oversized texts
    pub fn with_cut_char(mut self, cut_char: char) -> Self {
        self.cut_char = cut_char;
        self
    }

    /// Segment `text` into unique, trimmed, non-empty sentence strings
    pub fn segment(&self, text: &str) -> Segments {
        let mut seen = HashSet::new();
        let mut sentences = Vec::new();

        for chunk in self.chunks(text) {
            for span in self.detector.detect(chunk) {
                for piece in FALLBACK_DELIMITERS.split(&chunk[span]) {
                    let piece = piece.trim();
                    if piece.is_empty() {
                        continue;
                    }
                    if seen.insert(piece.to_string()) {
                        sentences.push(piece.to_string());
                    }
                }
            }
        }

        Segments { sentences }
    }

    fn chunks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.chars().count() <= self.max_chunk_chars {
            return vec![text];
        }
        let chunks: Vec<&str> = text.split(self.cut_char).collect();
        debug!(
            chunks = chunks.len(),
            "Text exceeded {} chars, cut on '{}'", self.max_chunk_chars, self.cut_char
        );
        chunks
    }
}

/// Deduplicated sentences of one document.
///
/// Iterating does not consume the segments, so they can be walked again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    sentences: Vec<String>,
}

impl Segments {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences
            .iter()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}

impl IntoIterator for Segments {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::extract::detector::PunctuationDetector;

    fn segmenter() -> SentenceSegmenter {
        SentenceSegmenter::new(Arc::new(PunctuationDetector::new()))
    }

    /// Treats the whole input as one sentence and counts calls
    struct WholeText {
        calls: AtomicUsize,
    }

    impl SentenceDetector for WholeText {
        fn detect(&self, text: &str) -> Vec<Range<usize>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![0..text.len()]
        }
    }

    #[test]
    fn test_splits_embedded_delimiters() {
        let text = "Vi erbjuder:\nFriskvård och bra lön * Flexibla tider - Trevliga kollegor    Fri parkering • Kaffe";
        let segments = segmenter().segment(text);
        let collected: Vec<&str> = segments.iter().collect();
        assert_eq!(
            collected,
            vec![
                "Vi erbjuder:",
                "Friskvård och bra lön",
                "Flexibla tider",
                "Trevliga kollegor",
                "Fri parkering",
                "Kaffe",
            ]
        );
    }

    #[test]
    fn test_three_spaces_split_but_two_do_not() {
        let segments = segmenter().segment("Ett  två tre   fyra fem");
        let collected: Vec<&str> = segments.iter().collect();
        assert_eq!(collected, vec!["Ett  två tre", "fyra fem"]);
    }

    #[test]
    fn test_hyphenated_words_are_not_split() {
        let segments = segmenter().segment("Vi söker en IT-tekniker till Malmö.");
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_duplicates_removed() {
        let text = "Välkommen med din ansökan! Välkommen med din ansökan! Vi ses.";
        let segments = segmenter().segment(text);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_restartable_iteration() {
        let segments = segmenter().segment("En mening. En till.");
        let first: Vec<&str> = segments.iter().collect();
        let second: Vec<&str> = (&segments).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_oversized_text_cut_on_cut_char() {
        let detector = Arc::new(WholeText {
            calls: AtomicUsize::new(0),
        });
        let segmenter = SentenceSegmenter::new(detector.clone()).with_max_chunk_chars(10);

        let segments = segmenter.segment("Alpha beta1Gamma delta1Epsilon");
        let collected: Vec<&str> = segments.iter().collect();

        assert_eq!(collected, vec!["Alpha beta", "Gamma delta", "Epsilon"]);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_text_at_limit_not_cut() {
        let detector = Arc::new(WholeText {
            calls: AtomicUsize::new(0),
        });
        let segmenter = SentenceSegmenter::new(detector.clone()).with_max_chunk_chars(11);

        let segments = segmenter.segment("Alpha1 beta");
        assert_eq!(segments.len(), 1);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }
}
