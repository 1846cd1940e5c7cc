//! Error types shared across the crate
//!
//! Provider faults (`LlmError`) never leave the insight generator; they are
//! folded into `SummaryResult` / `QuizResult`. Only precondition failures
//! (`PipelineError`) and settings I/O (`SettingsError`) reach callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure at the LLM boundary: transport, auth, quota or malformed envelope
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API key not set")]
    MissingCredential { provider: &'static str },

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response contained no text")]
    EmptyResponse,
}

/// Precondition failures that stop a run before (or instead of) generation
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing API key for {provider}. Pass --api-key or set {env_var}.")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("No PDF content was provided")]
    EmptyUpload,

    #[error("Could not extract text from the PDF. The file might be empty or corrupted.")]
    NoExtractableText,

    #[error(transparent)]
    Client(#[from] LlmError),
}

/// Settings file problems
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Kind tag carried by every generation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ApiFailure,
    ParseFailure,
    ValidationFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ApiFailure => "api_failure",
            FailureKind::ParseFailure => "parse_failure",
            FailureKind::ValidationFailure => "validation_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
