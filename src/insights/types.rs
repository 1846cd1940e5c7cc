//! Result structures handed to the presentation layer

use crate::error::FailureKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Why a generation step produced no usable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    /// Fixed human-readable message, safe to show as-is
    #[serde(rename = "error")]
    pub message: String,
    /// Underlying cause, for logs and diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The model's reply, when there was one to blame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Summary, key points and study questions for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub study_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<GenerationFailure>,
}

impl SummaryResult {
    pub const EMPTY_INPUT_MESSAGE: &'static str =
        "Could not generate summary because no text was provided.";
    pub const API_FAILURE_MESSAGE: &'static str = "Failed to generate summary due to an API error.";
    pub const PARSE_FAILURE_MESSAGE: &'static str =
        "Failed to parse summary from the model's response.";

    /// Fixed result for a document with no text
    pub fn empty_input() -> Self {
        Self {
            summary: Self::EMPTY_INPUT_MESSAGE.to_string(),
            key_points: Vec::new(),
            study_questions: Vec::new(),
            failure: None,
        }
    }

    /// Failure result: fixed message in `summary`, both lists empty
    pub fn failed(failure: GenerationFailure) -> Self {
        Self {
            summary: failure.message.clone(),
            key_points: Vec::new(),
            study_questions: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// One multiple-choice question. `options` keeps the model's label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    pub options: IndexMap<String, String>,
    pub correct_answer: String,
}

/// Outcome of checking a learner's choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerCheck {
    Correct { answer: String },
    Incorrect { correct_label: String, answer: String },
    /// The question's own answer key is unusable
    NoAnswerKey,
}

impl MultipleChoiceQuestion {
    /// Compare a chosen label (case-insensitive) against `correct_answer`
    pub fn check_answer(&self, chosen_label: &str) -> AnswerCheck {
        let Some(answer) = self.options.get(self.correct_answer.trim()) else {
            return AnswerCheck::NoAnswerKey;
        };

        if chosen_label.trim().eq_ignore_ascii_case(self.correct_answer.trim()) {
            AnswerCheck::Correct {
                answer: answer.clone(),
            }
        } else {
            AnswerCheck::Incorrect {
                correct_label: self.correct_answer.trim().to_string(),
                answer: answer.clone(),
            }
        }
    }

    /// Option label matching user input, accepting either case
    pub fn find_label(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        self.options
            .keys()
            .find(|label| label.eq_ignore_ascii_case(input))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswerQuestion {
    pub question: String,
}

/// A decoded quiz
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub multiple_choice_questions: Vec<MultipleChoiceQuestion>,
    pub short_answer_questions: Vec<ShortAnswerQuestion>,
}

impl Quiz {
    pub fn is_empty(&self) -> bool {
        self.multiple_choice_questions.is_empty() && self.short_answer_questions.is_empty()
    }
}

/// Either a quiz or the reason there is none.
///
/// Serializes flat: a quiz as its two arrays, a failure as
/// `{ "kind", "error", "raw_response" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizResult {
    Ready(Quiz),
    Failed(GenerationFailure),
}

impl QuizResult {
    pub const API_FAILURE_MESSAGE: &'static str = "Failed to generate quiz due to an API error.";
    pub const PARSE_FAILURE_MESSAGE: &'static str = "Failed to parse quiz from the model's response.";
    pub const VALIDATION_FAILURE_MESSAGE: &'static str =
        "The generated quiz did not match the expected structure.";

    /// Fixed result for a document with no text
    pub fn empty_input() -> Self {
        QuizResult::Ready(Quiz::default())
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        match self {
            QuizResult::Ready(quiz) => Some(quiz),
            QuizResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            QuizResult::Ready(_) => None,
            QuizResult::Failed(failure) => Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mcq() -> MultipleChoiceQuestion {
        let mut options = IndexMap::new();
        options.insert("A".to_string(), "Mitochondria".to_string());
        options.insert("B".to_string(), "Ribosome".to_string());
        options.insert("C".to_string(), "Nucleus".to_string());
        options.insert("D".to_string(), "Golgi body".to_string());
        MultipleChoiceQuestion {
            question: "Which organelle produces ATP?".to_string(),
            options,
            correct_answer: "A".to_string(),
        }
    }

    #[test]
    fn test_check_answer_correct_is_case_insensitive() {
        let mcq = sample_mcq();
        assert_eq!(
            mcq.check_answer("a"),
            AnswerCheck::Correct { answer: "Mitochondria".to_string() }
        );
    }

    #[test]
    fn test_check_answer_incorrect_reports_right_option() {
        let mcq = sample_mcq();
        assert_eq!(
            mcq.check_answer("C"),
            AnswerCheck::Incorrect {
                correct_label: "A".to_string(),
                answer: "Mitochondria".to_string()
            }
        );
    }

    #[test]
    fn test_check_answer_without_usable_key() {
        let mut mcq = sample_mcq();
        mcq.correct_answer = "E".to_string();
        assert_eq!(mcq.check_answer("A"), AnswerCheck::NoAnswerKey);
    }

    #[test]
    fn test_find_label() {
        let mcq = sample_mcq();
        assert_eq!(mcq.find_label(" d "), Some("D"));
        assert_eq!(mcq.find_label("E"), None);
    }

    #[test]
    fn test_options_keep_reply_order() {
        let json = r#"{"question": "q", "options": {"D": "4", "A": "1", "C": "3", "B": "2"}, "correct_answer": "B"}"#;
        let mcq: MultipleChoiceQuestion = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = mcq.options.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["D", "A", "C", "B"]);
    }

    #[test]
    fn test_summary_failure_keeps_lists_empty() {
        let result = SummaryResult::failed(GenerationFailure {
            kind: FailureKind::ApiFailure,
            message: SummaryResult::API_FAILURE_MESSAGE.to_string(),
            detail: Some("timeout".to_string()),
            raw_response: None,
        });
        assert_eq!(result.summary, SummaryResult::API_FAILURE_MESSAGE);
        assert!(result.key_points.is_empty());
        assert!(result.study_questions.is_empty());
        assert!(result.is_failure());
    }

    #[test]
    fn test_quiz_failure_serializes_flat() {
        let result = QuizResult::Failed(GenerationFailure {
            kind: FailureKind::ParseFailure,
            message: QuizResult::PARSE_FAILURE_MESSAGE.to_string(),
            detail: None,
            raw_response: Some("not json at all".to_string()),
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "parse_failure");
        assert_eq!(value["error"], QuizResult::PARSE_FAILURE_MESSAGE);
        assert_eq!(value["raw_response"], "not json at all");
        assert!(value.get("multiple_choice_questions").is_none());
    }

    #[test]
    fn test_empty_quiz_serializes_as_arrays() {
        let value = serde_json::to_value(QuizResult::empty_input()).unwrap();
        assert_eq!(value["multiple_choice_questions"], serde_json::json!([]));
        assert_eq!(value["short_answer_questions"], serde_json::json!([]));
    }
}
