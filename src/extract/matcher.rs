//! Whole-token form matching.

/// Characters treated as token separators in addition to whitespace
const SEPARATORS: &[char] = &[
    '.', ',', '!', '?', '„', '"', '“', '”', '\n', ':', ';', '`', '´', '$', '€',
];

/// Case-insensitive whole-token matcher.
///
/// Substrings of longer tokens never match: "art" does not match "party".
#[derive(Debug, Clone, Copy, Default)]
pub struct FormMatcher;

impl FormMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Does `sentence` contain `representation` as a whole token (or, for a
    /// multi-word representation, as a contiguous run of tokens)?
    pub fn matches(&self, sentence: &str, representation: &str) -> bool {
        let needle = tokenize(representation);
        if needle.is_empty() {
            return false;
        }
        let haystack = tokenize(sentence);
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_slice())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(SEPARATORS, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_token_only() {
        let matcher = FormMatcher::new();
        assert!(!matcher.matches("Hon köpte konst och deltog i en fest.", "art"));
        assert!(!matcher.matches("We went to a party yesterday.", "art"));
        assert!(matcher.matches("Modern art is hard to explain.", "art"));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = FormMatcher::new();
        assert!(matcher.matches("Rapport från mötet skickas ut.", "rapport"));
        assert!(matcher.matches("Hon läste RAPPORTEN noga.", "Rapporten"));
    }

    #[test]
    fn test_adjacent_punctuation() {
        let matcher = FormMatcher::new();
        assert!(matcher.matches("Hon skrev en lång rapport.", "rapport"));
        assert!(matcher.matches("Rapport, protokoll och bilagor.", "rapport"));
        assert!(matcher.matches("Han sa „rapport“ flera gånger.", "rapport"));
        assert!(matcher.matches("Summa: 10€ per rapport; inte mer.", "rapport"));
    }

    #[test]
    fn test_hyphenated_token_is_distinct() {
        let matcher = FormMatcher::new();
        assert!(!matcher.matches("Vi söker en IT-tekniker.", "tekniker"));
    }

    #[test]
    fn test_multi_word_representation() {
        let matcher = FormMatcher::new();
        assert!(matcher.matches("Du måste ta hand om katten.", "ta hand om"));
        assert!(!matcher.matches("Ta katten om hand.", "ta hand om"));
    }

    #[test]
    fn test_empty_representation_never_matches() {
        let matcher = FormMatcher::new();
        assert!(!matcher.matches("Något helt annat.", "  "));
    }
}
