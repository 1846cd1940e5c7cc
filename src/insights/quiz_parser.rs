//! Quiz reply decoding and validation
//!
//! Models wrap JSON in code fences and chat around it despite instructions.
//! Decoding strips a fence, cuts from the first `{` to the last `}`, then
//! decodes in two passes so bad syntax (parse_failure) stays distinct from
//! well-formed JSON with the wrong shape (validation_failure).

use super::types::{MultipleChoiceQuestion, Quiz};
use crate::error::FailureKind;
use crate::settings::QuizSchema;
use indexmap::IndexMap;
use serde::de::IgnoredAny;
use thiserror::Error;

pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Error)]
pub enum QuizReplyError {
    #[error("no JSON object found in the response")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("JSON does not follow the quiz schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("quiz failed validation: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl QuizReplyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            QuizReplyError::NoJsonObject | QuizReplyError::InvalidJson(_) => FailureKind::ParseFailure,
            QuizReplyError::Schema(_) | QuizReplyError::Invalid(_) => FailureKind::ValidationFailure,
        }
    }
}

/// Remove a surrounding ``` / ```json fence, if any
pub fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// The substring from the first `{` to the last `}`
pub fn json_candidate(reply: &str) -> Result<&str, QuizReplyError> {
    let text = strip_code_fence(reply);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(QuizReplyError::NoJsonObject),
    }
}

/// Decode a reply into a quiz without checking it against the schema counts
pub fn decode_quiz(reply: &str) -> Result<Quiz, QuizReplyError> {
    let candidate = json_candidate(reply)?;

    serde_json::from_str::<IgnoredAny>(candidate).map_err(QuizReplyError::InvalidJson)?;
    let mut quiz: Quiz = serde_json::from_str(candidate).map_err(QuizReplyError::Schema)?;

    for mcq in &mut quiz.multiple_choice_questions {
        normalize_labels(mcq);
    }
    Ok(quiz)
}

/// Decode and validate
pub fn parse_quiz(reply: &str, schema: &QuizSchema) -> Result<Quiz, QuizReplyError> {
    let quiz = decode_quiz(reply)?;
    validate_quiz(&quiz, schema)?;
    Ok(quiz)
}

/// Canonical option labels ("a " -> "A") and an answer key that points at one.
///
/// Resolution order: a bare label ("A", "a", "A)", "(A)"), then the exact text
/// of an option, then a label followed by text ("A. Mitochondria"). Option text
/// such as "A and B" therefore never resolves to label A.
fn normalize_labels(mcq: &mut MultipleChoiceQuestion) {
    let options = std::mem::take(&mut mcq.options);
    mcq.options = options
        .into_iter()
        .map(|(label, text)| (label.trim().to_uppercase(), text))
        .collect::<IndexMap<_, _>>();

    let answer = mcq.correct_answer.trim();
    let resolved = mcq
        .options
        .keys()
        .find(|label| is_bare_label(label, answer))
        .or_else(|| {
            mcq.options
                .iter()
                .find(|(_, text)| text.trim().eq_ignore_ascii_case(answer))
                .map(|(label, _)| label)
        })
        .or_else(|| mcq.options.keys().find(|label| is_labelled_text(label, answer)))
        .cloned();

    mcq.correct_answer = resolved.unwrap_or_else(|| answer.to_string());
}

/// "A", "(A)", "A)", "A." or "A:" with nothing else
fn is_bare_label(label: &str, answer: &str) -> bool {
    let answer = answer.strip_prefix('(').unwrap_or(answer);
    let answer = answer.strip_suffix([')', '.', ':']).unwrap_or(answer);
    answer.trim().eq_ignore_ascii_case(label)
}

/// "A) text", "(A) text", "A. text", "A: text", "A - text"
fn is_labelled_text(label: &str, answer: &str) -> bool {
    let answer = answer.trim_start_matches('(');
    let Some(head) = answer.get(..label.len()) else {
        return false;
    };
    let rest = &answer[label.len()..];
    head.eq_ignore_ascii_case(label)
        && rest
            .chars()
            .next()
            .is_some_and(|c| matches!(c, ')' | '.' | ':' | ' ' | '-'))
}

/// Check field contents, labels and (optionally) question counts
pub fn validate_quiz(quiz: &Quiz, schema: &QuizSchema) -> Result<(), QuizReplyError> {
    let mut issues = Vec::new();

    if quiz.is_empty() {
        issues.push("quiz contains no questions".to_string());
    }

    if schema.enforce_counts {
        if quiz.multiple_choice_questions.len() != schema.multiple_choice_count {
            issues.push(format!(
                "expected {} multiple-choice questions, got {}",
                schema.multiple_choice_count,
                quiz.multiple_choice_questions.len()
            ));
        }
        if quiz.short_answer_questions.len() != schema.short_answer_count {
            issues.push(format!(
                "expected {} short-answer questions, got {}",
                schema.short_answer_count,
                quiz.short_answer_questions.len()
            ));
        }
    }

    for (i, mcq) in quiz.multiple_choice_questions.iter().enumerate() {
        let at = format!("multiple_choice_questions[{}]", i);

        if mcq.question.trim().is_empty() {
            issues.push(format!("{}: question is empty", at));
        }

        let labels: Vec<&str> = mcq.options.keys().map(String::as_str).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        if sorted != OPTION_LABELS {
            issues.push(format!(
                "{}: options must be labelled A-D, got [{}]",
                at,
                labels.join(", ")
            ));
        }

        for (label, text) in &mcq.options {
            if text.trim().is_empty() {
                issues.push(format!("{}: option {} is empty", at, label));
            }
        }

        if !mcq.options.contains_key(&mcq.correct_answer) {
            issues.push(format!(
                "{}: correct_answer '{}' is not one of the option labels",
                at, mcq.correct_answer
            ));
        }
    }

    for (i, saq) in quiz.short_answer_questions.iter().enumerate() {
        if saq.question.trim().is_empty() {
            issues.push(format!("short_answer_questions[{}]: question is empty", i));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(QuizReplyError::Invalid(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_json(question: &str, answer: &str) -> String {
        format!(
            r#"{{"question": "{}", "options": {{"A": "one", "B": "two", "C": "three", "D": "four"}}, "correct_answer": "{}"}}"#,
            question, answer
        )
    }

    fn quiz_json(mcqs: usize, shorts: usize) -> String {
        let mcq: Vec<String> = (0..mcqs).map(|i| mcq_json(&format!("Question {}?", i + 1), "B")).collect();
        let saq: Vec<String> = (0..shorts)
            .map(|i| format!(r#"{{"question": "Explain idea {}."}}"#, i + 1))
            .collect();
        format!(
            r#"{{"multiple_choice_questions": [{}], "short_answer_questions": [{}]}}"#,
            mcq.join(", "),
            saq.join(", ")
        )
    }

    #[test]
    fn test_fenced_reply_matches_inner_object() {
        let inner = quiz_json(5, 3);
        let fenced = format!("```json\n{}\n```", inner);
        assert_eq!(decode_quiz(&fenced).unwrap(), decode_quiz(&inner).unwrap());

        let untagged = format!("```\n{}\n```", inner);
        assert_eq!(decode_quiz(&untagged).unwrap(), decode_quiz(&inner).unwrap());
    }

    #[test]
    fn test_leading_and_trailing_commentary() {
        let inner = quiz_json(5, 3);
        let chatty = format!("Sure! Here is your quiz:\n\n{}\n\nLet me know if you need more.", inner);
        assert_eq!(decode_quiz(&chatty).unwrap(), decode_quiz(&inner).unwrap());
    }

    #[test]
    fn test_no_braces_is_parse_failure() {
        let err = decode_quiz("not json at all").unwrap_err();
        assert!(matches!(err, QuizReplyError::NoJsonObject));
        assert_eq!(err.kind(), FailureKind::ParseFailure);
    }

    #[test]
    fn test_closing_brace_before_opening_is_parse_failure() {
        let err = decode_quiz("} nothing here {").unwrap_err();
        assert!(matches!(err, QuizReplyError::NoJsonObject));
    }

    #[test]
    fn test_broken_json_is_parse_failure() {
        let err = decode_quiz(r#"{"multiple_choice_questions": [ {"question": "x", }"#).unwrap_err();
        assert!(matches!(err, QuizReplyError::InvalidJson(_)));
        assert_eq!(err.kind(), FailureKind::ParseFailure);
    }

    #[test]
    fn test_wrong_shape_is_validation_failure() {
        let err = decode_quiz(r#"{"questions": []}"#).unwrap_err();
        assert!(matches!(err, QuizReplyError::Schema(_)));
        assert_eq!(err.kind(), FailureKind::ValidationFailure);
    }

    #[test]
    fn test_valid_quiz_passes_validation() {
        let quiz = parse_quiz(&quiz_json(5, 3), &QuizSchema::default()).unwrap();
        assert_eq!(quiz.multiple_choice_questions.len(), 5);
        assert_eq!(quiz.short_answer_questions.len(), 3);
        assert_eq!(quiz.multiple_choice_questions[0].correct_answer, "B");
    }

    #[test]
    fn test_count_mismatch_respects_enforce_flag() {
        let reply = quiz_json(4, 3);
        let err = parse_quiz(&reply, &QuizSchema::default()).unwrap_err();
        match err {
            QuizReplyError::Invalid(issues) => {
                assert_eq!(issues, vec!["expected 5 multiple-choice questions, got 4"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let relaxed = QuizSchema {
            enforce_counts: false,
            ..QuizSchema::default()
        };
        assert!(parse_quiz(&reply, &relaxed).is_ok());
    }

    #[test]
    fn test_empty_quiz_is_rejected_even_when_relaxed() {
        let relaxed = QuizSchema {
            enforce_counts: false,
            ..QuizSchema::default()
        };
        let err = parse_quiz(&quiz_json(0, 0), &relaxed).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ValidationFailure);
    }

    #[test]
    fn test_answer_outside_labels_is_rejected() {
        let reply = format!(
            r#"{{"multiple_choice_questions": [{}], "short_answer_questions": [{{"question": "Why?"}}]}}"#,
            mcq_json("Pick one", "E")
        );
        let schema = QuizSchema {
            enforce_counts: false,
            ..QuizSchema::default()
        };
        let err = parse_quiz(&reply, &schema).unwrap_err();
        assert!(err.to_string().contains("correct_answer 'E' is not one of the option labels"));
    }

    #[test]
    fn test_missing_option_label_is_rejected() {
        let reply = r#"{"multiple_choice_questions": [{"question": "q", "options": {"A": "1", "B": "2", "C": "3"}, "correct_answer": "A"}], "short_answer_questions": [{"question": "s"}]}"#;
        let schema = QuizSchema {
            enforce_counts: false,
            ..QuizSchema::default()
        };
        let err = parse_quiz(reply, &schema).unwrap_err();
        assert!(err.to_string().contains("options must be labelled A-D, got [A, B, C]"));
    }

    #[test]
    fn test_answer_key_variants_are_normalized() {
        for answer in ["b", "B)", "(B)", "B. two", "two"] {
            let reply = format!(
                r#"{{"multiple_choice_questions": [{}], "short_answer_questions": []}}"#,
                mcq_json("q", answer)
            );
            let quiz = decode_quiz(&reply).unwrap();
            assert_eq!(quiz.multiple_choice_questions[0].correct_answer, "B", "answer {:?}", answer);
        }
    }

    #[test]
    fn test_option_text_starting_with_a_label_keeps_its_own_label() {
        let reply = r#"{"multiple_choice_questions": [{"question": "Which are even?", "options": {"A": "4 only", "B": "6 only", "C": "A and B", "D": "2 and 3"}, "correct_answer": "A and B"}], "short_answer_questions": []}"#;
        let quiz = decode_quiz(reply).unwrap();
        assert_eq!(quiz.multiple_choice_questions[0].correct_answer, "C");

        let reply = r#"{"multiple_choice_questions": [{"question": "q", "options": {"A": "yes", "B": "no", "C": "maybe", "D": "D - none"}, "correct_answer": "D - none"}], "short_answer_questions": []}"#;
        let quiz = decode_quiz(reply).unwrap();
        assert_eq!(quiz.multiple_choice_questions[0].correct_answer, "D");
    }

    #[test]
    fn test_labelled_answer_text_still_resolves() {
        let reply = r#"{"multiple_choice_questions": [{"question": "q", "options": {"A": "4 only", "B": "6 only", "C": "A and B", "D": "2 and 3"}, "correct_answer": "C) A and B"}], "short_answer_questions": []}"#;
        let quiz = decode_quiz(reply).unwrap();
        assert_eq!(quiz.multiple_choice_questions[0].correct_answer, "C");
    }

    #[test]
    fn test_lowercase_option_labels_are_normalized_in_order() {
        let reply = r#"{"multiple_choice_questions": [{"question": "q", "options": {"b": "2", "a": "1", "d": "4", "c": "3"}, "correct_answer": "a"}], "short_answer_questions": [{"question": "s"}]}"#;
        let quiz = decode_quiz(reply).unwrap();
        let mcq = &quiz.multiple_choice_questions[0];
        let labels: Vec<&str> = mcq.options.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["B", "A", "D", "C"]);
        assert_eq!(mcq.correct_answer, "A");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let reply = r#"{"title": "Quiz", "multiple_choice_questions": [], "short_answer_questions": [{"question": "s", "answer_hint": "h"}]}"#;
        let quiz = decode_quiz(reply).unwrap();
        assert_eq!(quiz.short_answer_questions[0].question, "s");
    }
}
