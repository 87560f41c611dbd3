// ============================================================
// Layer 3 — QaRecord Domain Type
// ============================================================
// One labelled question/answer pair as read from the corpus.
// Fields are optional because real corpus rows can be missing
// either side; normalization substitutes fixed placeholders so
// every record resolves to non-empty text downstream.
//
// A record is read once from the corpus, normalized, tokenized,
// and then discarded — it is never mutated.
//
// Reference: Rust Book §5 (Structs), §6 (Option)

use serde::{Deserialize, Serialize};

/// Placeholder substituted for a missing or empty question.
pub const UNKNOWN_QUESTION: &str = "Unknown question";

/// Placeholder substituted for a missing or empty answer.
pub const NO_ANSWER: &str = "No answer available";

/// A raw labelled example. The corpus stores the answer under an
/// `answers` key (plural), which the serde alias accepts too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    /// The natural language question, if present
    pub question: Option<String>,

    /// The reference answer, if present
    #[serde(alias = "answers")]
    pub answer: Option<String>,
}

impl QaRecord {
    /// Create a record from already-present question and answer text
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer:   Some(answer.into()),
        }
    }

    /// The question text with the fixed placeholder substituted for
    /// a missing or empty field. Never returns an empty string.
    pub fn question_text(&self) -> &str {
        match self.question.as_deref() {
            Some(q) if !q.is_empty() => q,
            _ => UNKNOWN_QUESTION,
        }
    }

    /// The answer text with the fixed placeholder substituted for
    /// a missing or empty field. Never returns an empty string.
    pub fn answer_text(&self) -> &str {
        match self.answer.as_deref() {
            Some(a) if !a.is_empty() => a,
            _ => NO_ANSWER,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_fields_pass_through() {
        let r = QaRecord::new("How deep to plant maize?", "About 5 cm.");
        assert_eq!(r.question_text(), "How deep to plant maize?");
        assert_eq!(r.answer_text(), "About 5 cm.");
    }

    #[test]
    fn test_missing_question_gets_placeholder() {
        let r = QaRecord { question: None, answer: Some("An answer".into()) };
        assert_eq!(r.question_text(), UNKNOWN_QUESTION);
    }

    #[test]
    fn test_empty_answer_gets_placeholder() {
        let r = QaRecord { question: Some("A question".into()), answer: Some(String::new()) };
        assert_eq!(r.answer_text(), NO_ANSWER);
    }

    #[test]
    fn test_answers_alias_accepted() {
        // The corpus field is named `answers`
        let r: QaRecord = serde_json::from_str(
            r#"{"question": "What is compost?", "answers": "Decomposed organic matter."}"#,
        ).unwrap();
        assert_eq!(r.answer_text(), "Decomposed organic matter.");
    }
}
