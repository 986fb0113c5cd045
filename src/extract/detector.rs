//! Sentence-boundary detection.
//!
//! The segmenter treats detection as an opaque capability: anything that
//! turns a text into deterministic byte spans can be plugged in. The bundled
//! `PunctuationDetector` is a rule-based splitter with per-language
//! abbreviation lists.

use std::ops::Range;

use crate::domain::LanguageCode;

/// Opaque sentence-boundary capability
pub trait SentenceDetector: Send + Sync {
    /// Byte spans of the sentences in `text`, in order.
    ///
    /// Must be deterministic for a given input.
    fn detect(&self, text: &str) -> Vec<Range<usize>>;
}

/// Abbreviations that never end a sentence in Swedish text
const SWEDISH_ABBREVIATIONS: &[&str] = &[
    "t.ex.", "m.m.", "dvs.", "bl.a.", "ang.", "kl.", "s.k.", "resp.", "prop.", "skr.", "osv.",
    "m.fl.", "fr.o.m.", "t.o.m.", "ca.", "st.", "nr.",
];

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "etc.", "mr.", "mrs.", "ms.", "dr.", "prof.", "vs.", "no.", "st.",
];

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLOSERS: &[char] = &['"', '\'', '”', '’', '»', ')', ']'];

/// Rule-based detector: a sentence ends after `.`, `!`, `?` or `…`
/// (plus closing quotes/brackets) followed by whitespace, unless the
/// preceding word is a known abbreviation or the next word is lowercase.
#[derive(Debug, Clone, Default)]
pub struct PunctuationDetector {
    abbreviations: Vec<String>,
}

impl PunctuationDetector {
    /// Detector without any abbreviation knowledge
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with the abbreviation list for a language
    pub fn for_language(language: &LanguageCode) -> Self {
        let list: &[&str] = match language.as_str() {
            "sv" => SWEDISH_ABBREVIATIONS,
            "en" => ENGLISH_ABBREVIATIONS,
            _ => &[],
        };
        Self {
            abbreviations: list.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Add extra abbreviations (compared case-insensitively)
    pub fn with_abbreviations(mut self, extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.abbreviations
            .extend(extra.into_iter().map(|a| a.into().to_lowercase()));
        self
    }

    fn ends_with_abbreviation(&self, text: &str, dot_end: usize) -> bool {
        let before = &text[..dot_end];
        let word_start = before
            .rfind(char::is_whitespace)
            .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let word = before[word_start..].to_lowercase();
        // Strip opening punctuation such as "(t.ex."
        let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());
        self.abbreviations.iter().any(|a| a == word)
    }
}

impl SentenceDetector for PunctuationDetector {
    fn detect(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if !TERMINATORS.contains(&c) {
                continue;
            }

            // Swallow runs like "?!" or "...\"" into the current sentence
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if TERMINATORS.contains(&next) || CLOSERS.contains(&next) {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }

            let rest = &text[end..];
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                continue;
            }

            if c == '.' && self.ends_with_abbreviation(text, i + 1) {
                continue;
            }

            if rest
                .trim_start()
                .chars()
                .next()
                .is_some_and(char::is_lowercase)
            {
                continue;
            }

            push_trimmed(text, start..end, &mut spans);
            start = end;
        }

        push_trimmed(text, start..text.len(), &mut spans);
        spans
    }
}

/// Push `range` with surrounding whitespace removed, skipping blank spans
fn push_trimmed(text: &str, range: Range<usize>, spans: &mut Vec<Range<usize>>) {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading + trailing >= slice.len() {
        return;
    }
    spans.push(range.start + leading..range.end - trailing);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences<'a>(detector: &PunctuationDetector, text: &'a str) -> Vec<&'a str> {
        detector
            .detect(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn test_splits_on_terminators() {
        let detector = PunctuationDetector::new();
        let text = "Vi söker en kock. Är du intresserad? Ring oss!";
        assert_eq!(
            sentences(&detector, text),
            vec!["Vi söker en kock.", "Är du intresserad?", "Ring oss!"]
        );
    }

    #[test]
    fn test_keeps_trailing_fragment() {
        let detector = PunctuationDetector::new();
        assert_eq!(
            sentences(&detector, "Första meningen. Ingen punkt på slutet"),
            vec!["Första meningen.", "Ingen punkt på slutet"]
        );
    }

    #[test]
    fn test_swedish_abbreviations_do_not_split() {
        let detector = PunctuationDetector::for_language(&LanguageCode::new("sv"));
        let text = "Vi erbjuder bl.a. friskvård. Välkommen med din ansökan.";
        assert_eq!(
            sentences(&detector, text),
            vec!["Vi erbjuder bl.a. friskvård.", "Välkommen med din ansökan."]
        );
    }

    #[test]
    fn test_lowercase_continuation_does_not_split() {
        let detector = PunctuationDetector::new();
        let text = "Han kom kl. nio och gick. Sedan regnade det.";
        assert_eq!(
            sentences(&detector, text),
            vec!["Han kom kl. nio och gick.", "Sedan regnade det."]
        );
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let detector = PunctuationDetector::new();
        let text = "Hon sa \"Hej då.\" Sedan gick hon.";
        assert_eq!(
            sentences(&detector, text),
            vec!["Hon sa \"Hej då.\"", "Sedan gick hon."]
        );
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        let detector = PunctuationDetector::new();
        assert!(detector.detect("   \n ").is_empty());
        assert!(detector.detect("").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let detector = PunctuationDetector::for_language(&LanguageCode::new("en"));
        let text = "Dr. Smith arrived. He was late, e.g. by an hour! Why?";
        assert_eq!(detector.detect(text), detector.detect(text));
    }
}
