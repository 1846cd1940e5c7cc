//! Plain-text rendering of run results

use studydeck_lib::insights::{AnswerCheck, MultipleChoiceQuestion, QuizResult, SummaryResult};

pub(crate) fn render_summary(summary: &SummaryResult) -> String {
    let mut out = String::new();

    out.push_str("== Summary ==\n");
    out.push_str(&summary.summary);
    out.push('\n');
    if let Some(detail) = summary.failure.as_ref().and_then(|f| f.detail.as_deref()) {
        out.push_str(&format!("  (reason: {})\n", detail));
    }

    out.push_str("\n== Key Points ==\n");
    if summary.key_points.is_empty() {
        out.push_str("No key points were generated.\n");
    } else {
        for point in &summary.key_points {
            out.push_str(&format!("- {}\n", point));
        }
    }

    out.push_str("\n== Study Questions ==\n");
    if summary.study_questions.is_empty() {
        out.push_str("No study questions were generated.\n");
    } else {
        for (i, question) in summary.study_questions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, question));
        }
    }

    out
}

pub(crate) fn render_mcq(index: usize, mcq: &MultipleChoiceQuestion) -> String {
    let mut out = format!("{}. {}\n", index, mcq.question);
    for (label, text) in &mcq.options {
        out.push_str(&format!("   {}) {}\n", label, text));
    }
    out
}

pub(crate) fn render_quiz(quiz: &QuizResult) -> String {
    let mut out = String::from("== Quiz ==\n");

    let quiz = match quiz {
        QuizResult::Failed(failure) => {
            out.push_str(&format!("Quiz Generation Failed: {}\n", failure.message));
            if let Some(detail) = &failure.detail {
                out.push_str(&format!("  ({}: {})\n", failure.kind, detail));
            }
            if let Some(raw) = &failure.raw_response {
                out.push_str("\n--- raw model response ---\n");
                out.push_str(raw.trim_end());
                out.push_str("\n--------------------------\n");
            }
            return out;
        }
        QuizResult::Ready(quiz) => quiz,
    };

    out.push_str("\nMultiple Choice Questions\n");
    if quiz.multiple_choice_questions.is_empty() {
        out.push_str("No multiple-choice questions were generated.\n");
    }
    for (i, mcq) in quiz.multiple_choice_questions.iter().enumerate() {
        out.push_str(&render_mcq(i + 1, mcq));
    }

    out.push_str("\nShort Answer Questions\n");
    if quiz.short_answer_questions.is_empty() {
        out.push_str("No short-answer questions were generated.\n");
    }
    for (i, saq) in quiz.short_answer_questions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, saq.question));
    }

    out
}

pub(crate) fn render_check(check: &AnswerCheck) -> String {
    match check {
        AnswerCheck::Correct { answer } => format!("Correct! The answer is {}", answer),
        AnswerCheck::Incorrect { correct_label, answer } => {
            format!("Incorrect. The correct answer is {}) {}", correct_label, answer)
        }
        AnswerCheck::NoAnswerKey => "This question has no usable answer key.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studydeck_lib::error::FailureKind;
    use studydeck_lib::insights::{GenerationFailure, Quiz, ShortAnswerQuestion};

    #[test]
    fn test_render_summary_lists() {
        let summary = SummaryResult {
            summary: "S".to_string(),
            key_points: vec!["P1".to_string(), "P2".to_string()],
            study_questions: vec!["Q1".to_string()],
            failure: None,
        };
        let text = render_summary(&summary);
        assert!(text.contains("- P1\n- P2\n"));
        assert!(text.contains("1. Q1\n"));
    }

    #[test]
    fn test_render_summary_empty_lists() {
        let text = render_summary(&SummaryResult::empty_input());
        assert!(text.contains("No key points were generated."));
        assert!(text.contains("No study questions were generated."));
    }

    #[test]
    fn test_render_failed_quiz_shows_raw_reply() {
        let quiz = QuizResult::Failed(GenerationFailure {
            kind: FailureKind::ParseFailure,
            message: QuizResult::PARSE_FAILURE_MESSAGE.to_string(),
            detail: Some("no JSON object found in the response".to_string()),
            raw_response: Some("not json at all".to_string()),
        });
        let text = render_quiz(&quiz);
        assert!(text.contains("Quiz Generation Failed"));
        assert!(text.contains("parse_failure"));
        assert!(text.contains("not json at all"));
    }

    #[test]
    fn test_render_quiz_short_answers() {
        let quiz = QuizResult::Ready(Quiz {
            multiple_choice_questions: vec![],
            short_answer_questions: vec![ShortAnswerQuestion { question: "Why?".to_string() }],
        });
        let text = render_quiz(&quiz);
        assert!(text.contains("No multiple-choice questions were generated."));
        assert!(text.contains("1. Why?"));
    }

    #[test]
    fn test_render_check() {
        let text = render_check(&AnswerCheck::Incorrect {
            correct_label: "B".to_string(),
            answer: "Ribosome".to_string(),
        });
        assert_eq!(text, "Incorrect. The correct answer is B) Ribosome");
    }
}
