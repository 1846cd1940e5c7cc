//! Per-document run: extract, summarize, quiz
//!
//! A `Session` is the explicit context for one run. It owns a freshly built
//! LLM client and a copy of the settings; nothing is shared between runs.
//! Stages run strictly in order, and a summary failure never prevents the
//! quiz attempt.

use crate::ai_client::{self, LlmClient};
use crate::document::{self, ExtractedDocument};
use crate::error::PipelineError;
use crate::insights::{InsightGenerator, QuizResult, SummaryResult};
use crate::settings::{self, Provider, Settings};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything the presentation layer needs for one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInsights {
    pub source: String,
    pub characters: usize,
    pub generated_at: DateTime<Utc>,
    pub provider: Provider,
    pub model: String,
    pub summary: SummaryResult,
    pub quiz: QuizResult,
}

/// Which generation steps to run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub quiz: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { quiz: true }
    }
}

pub struct Session {
    generator: InsightGenerator,
}

impl Session {
    /// Build a session from a caller-supplied credential.
    ///
    /// A missing credential fails here, before any extraction or LLM call.
    pub fn new(provider: Provider, api_key: Option<&str>, settings: &Settings) -> Result<Self, PipelineError> {
        let api_key = settings::resolve_api_key(provider, api_key).ok_or(PipelineError::MissingCredential {
            provider: provider.as_str(),
            env_var: provider.env_vars()[0],
        })?;

        let client = ai_client::build_client(provider, &api_key, settings)?;
        Ok(Self::with_client(client, settings))
    }

    /// Session around an existing client
    pub fn with_client(client: Box<dyn LlmClient>, settings: &Settings) -> Self {
        Self {
            generator: InsightGenerator::new(client, settings),
        }
    }

    pub fn generator(&self) -> &InsightGenerator {
        &self.generator
    }

    /// Full run over raw PDF bytes
    pub async fn process_pdf(
        &self,
        source: &str,
        pdf_bytes: &[u8],
        options: RunOptions,
    ) -> Result<DocumentInsights, PipelineError> {
        if pdf_bytes.is_empty() {
            return Err(PipelineError::EmptyUpload);
        }

        tracing::info!(source, bytes = pdf_bytes.len(), "Step 1: extracting text from the PDF");
        let document = document::extract_text_from_pdf(pdf_bytes);

        self.process_document(source, &document, options).await
    }

    /// Generation over already-extracted text. Empty text stops the run.
    pub async fn process_document(
        &self,
        source: &str,
        document: &ExtractedDocument,
        options: RunOptions,
    ) -> Result<DocumentInsights, PipelineError> {
        if document.is_empty() {
            tracing::warn!(source, "No extractable text, stopping");
            return Err(PipelineError::NoExtractableText);
        }

        tracing::info!(source, "Step 2: generating summary and study points");
        let summary = self.generator.generate_summary(document.text()).await;

        let quiz = if options.quiz {
            tracing::info!(source, "Step 3: generating quiz");
            self.generator.generate_quiz(document.text()).await
        } else {
            QuizResult::empty_input()
        };

        let client = self.generator.client();
        Ok(DocumentInsights {
            source: source.to_string(),
            characters: document.char_count(),
            generated_at: Utc::now(),
            provider: client.provider(),
            model: client.model().to_string(),
            summary,
            quiz,
        })
    }
}
