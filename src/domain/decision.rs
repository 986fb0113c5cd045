//! Terminal operator decisions on forms.
//!
//! A decision is recorded once per form and never overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final disposition of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A usage example was uploaded for the form
    Finished,

    /// The operator declined to work on the form
    Declined,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Finished => "finished",
            Outcome::Declined => "declined",
        }
    }
}

/// One line of the decision log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Form the decision applies to
    pub form_id: String,

    pub outcome: Outcome,

    /// When the decision was made
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Create a record stamped with the current time
    pub fn new(form_id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            form_id: form_id.into(),
            outcome,
            decided_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = DecisionRecord::new("L5-F1", Outcome::Declined);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"outcome\":\"declined\""));

        let parsed: DecisionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.form_id, "L5-F1");
        assert_eq!(parsed.outcome, Outcome::Declined);
    }
}
