//! Insight generation: summary + key points + study questions, and a quiz
//!
//! Each operation is one prompt, one LLM call, one parse. Nothing here
//! returns an error: API faults and unusable replies become the fixed failure
//! results defined in `types`, so the presentation layer always receives a
//! well-typed value.

pub mod prompts;
pub mod quiz_parser;
pub mod summary_parser;
pub mod types;

pub use types::{
    AnswerCheck, GenerationFailure, MultipleChoiceQuestion, Quiz, QuizResult, ShortAnswerQuestion,
    SummaryResult,
};

use crate::ai_client::LlmClient;
use crate::error::{FailureKind, LlmError};
use crate::settings::{QuizSchema, Settings};
use crate::utils::{preview, truncate_chars};

pub struct InsightGenerator {
    client: Box<dyn LlmClient>,
    quiz_schema: QuizSchema,
    max_document_chars: Option<usize>,
}

impl InsightGenerator {
    pub fn new(client: Box<dyn LlmClient>, settings: &Settings) -> Self {
        Self {
            client,
            quiz_schema: settings.quiz.clone(),
            max_document_chars: settings.max_document_chars,
        }
    }

    pub fn client(&self) -> &dyn LlmClient {
        self.client.as_ref()
    }

    /// Summary, exactly-5 key points and exactly-3 study questions
    pub async fn generate_summary(&self, text: &str) -> SummaryResult {
        if text.trim().is_empty() {
            return SummaryResult::empty_input();
        }

        let prompt = prompts::summary_prompt(self.document_slice(text));
        let reply = match self.ask("summary", &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(stage = "summary", error = %e, "Error during summary generation");
                return SummaryResult::failed(GenerationFailure {
                    kind: FailureKind::ApiFailure,
                    message: SummaryResult::API_FAILURE_MESSAGE.to_string(),
                    detail: Some(e.to_string()),
                    raw_response: None,
                });
            }
        };

        match summary_parser::parse_summary(&reply) {
            Ok(result) => {
                tracing::info!(
                    key_points = result.key_points.len(),
                    study_questions = result.study_questions.len(),
                    "Summary parsed"
                );
                result
            }
            Err(e) => {
                tracing::warn!(stage = "summary", error = %e, reply = %preview(&reply, 200), "Unusable summary reply");
                SummaryResult::failed(GenerationFailure {
                    kind: FailureKind::ParseFailure,
                    message: SummaryResult::PARSE_FAILURE_MESSAGE.to_string(),
                    detail: Some(e.to_string()),
                    raw_response: Some(reply),
                })
            }
        }
    }

    /// Multiple-choice and short-answer quiz, decoded from the model's JSON
    pub async fn generate_quiz(&self, text: &str) -> QuizResult {
        if text.trim().is_empty() {
            return QuizResult::empty_input();
        }

        let prompt = prompts::quiz_prompt(self.document_slice(text), &self.quiz_schema);
        let reply = match self.ask("quiz", &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(stage = "quiz", error = %e, "Error during quiz generation");
                return QuizResult::Failed(GenerationFailure {
                    kind: FailureKind::ApiFailure,
                    message: QuizResult::API_FAILURE_MESSAGE.to_string(),
                    detail: Some(e.to_string()),
                    raw_response: None,
                });
            }
        };

        match quiz_parser::parse_quiz(&reply, &self.quiz_schema) {
            Ok(quiz) => {
                tracing::info!(
                    multiple_choice = quiz.multiple_choice_questions.len(),
                    short_answer = quiz.short_answer_questions.len(),
                    "Quiz parsed"
                );
                QuizResult::Ready(quiz)
            }
            Err(e) => {
                let kind = e.kind();
                tracing::warn!(stage = "quiz", %kind, error = %e, "Unusable quiz reply");
                tracing::debug!(raw_response = %reply, "Raw quiz reply");
                let message = match kind {
                    FailureKind::ValidationFailure => QuizResult::VALIDATION_FAILURE_MESSAGE,
                    _ => QuizResult::PARSE_FAILURE_MESSAGE,
                };
                QuizResult::Failed(GenerationFailure {
                    kind,
                    message: message.to_string(),
                    detail: Some(e.to_string()),
                    raw_response: Some(reply),
                })
            }
        }
    }

    /// The part of the document sent to the model
    fn document_slice<'a>(&self, text: &'a str) -> &'a str {
        match self.max_document_chars {
            Some(max) => {
                let slice = truncate_chars(text, max);
                if slice.len() < text.len() {
                    tracing::info!(max_chars = max, "Document truncated for the prompt");
                }
                slice
            }
            None => text,
        }
    }

    /// One LLM call, with usage logging
    async fn ask(&self, stage: &'static str, prompt: &str) -> Result<String, LlmError> {
        tracing::info!(
            stage,
            provider = %self.client.provider(),
            model = self.client.model(),
            prompt_chars = prompt.len(),
            "Calling LLM"
        );

        let reply = self.client.complete(prompt).await?;

        if let Some(usage) = reply.usage {
            tracing::info!(
                stage,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "LLM usage"
            );
        }
        tracing::debug!(stage, reply = %reply.text, "LLM reply");
        Ok(reply.text)
    }
}
