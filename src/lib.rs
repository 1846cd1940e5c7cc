//! studydeck: summaries, key points, study questions and quizzes from PDFs
//!
//! Pipeline: `document` extracts text, `insights` runs one LLM call per
//! artifact through an `ai_client::LlmClient`, and `pipeline::Session`
//! sequences the stages for one document.

pub mod ai_client;
pub mod document;
pub mod error;
pub mod insights;
pub mod pipeline;
pub mod settings;
pub mod utils;
