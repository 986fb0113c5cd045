//! Lexicographic forms that need an illustrative example sentence.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Wikimedia language code of a form or a corpus (e.g. "sv", "en").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Languages with a fast sentence detector get larger network budgets
    pub fn has_fast_detector(&self) -> bool {
        matches!(self.0.as_str(), "sv" | "en")
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for LanguageCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// A specific inflected surface form of a lexeme (e.g. "L1234-F2").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Stable form identifier, unique per lexicographic entry
    pub id: String,

    /// Literal string searched for in corpora
    pub representation: String,

    /// Language of the lexeme
    pub language: LanguageCode,

    /// Lexeme the form belongs to (display/export only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexeme_id: Option<String>,

    /// Lexical category label, e.g. "noun" (display only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_category: Option<String>,
}

impl Form {
    /// Create a form, validating id and representation
    pub fn new(
        id: impl Into<String>,
        representation: impl Into<String>,
        language: impl Into<LanguageCode>,
    ) -> Result<Self, DomainError> {
        let form = Self {
            id: id.into(),
            representation: representation.into(),
            language: language.into(),
            lexeme_id: None,
            lexical_category: None,
        };
        form.validate()?;
        Ok(form)
    }

    /// Check the invariants of a form (also used on deserialized input)
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::EmptyFormId);
        }
        if self.representation.trim().is_empty() {
            return Err(DomainError::EmptyRepresentation(self.id.clone()));
        }
        Ok(())
    }

    pub fn with_lexeme(mut self, lexeme_id: impl Into<String>) -> Self {
        self.lexeme_id = Some(lexeme_id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.lexical_category = Some(category.into());
        self
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.representation, self.id)
    }
}
