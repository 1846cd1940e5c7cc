//! Application settings storage
//!
//! Stores provider and generation options in a JSON file in the app data
//! directory. Settings are loaded into a plain value and passed into each run;
//! there is no process-wide settings state. API keys are never written here:
//! they come from the command line or the provider's environment variable.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "studydeck";
const SETTINGS_FILE: &str = "settings.json";

/// Hosted LLM backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Anthropic,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Anthropic => "claude-haiku-4-5-20251001",
            Provider::OpenAi => "gpt-4o",
        }
    }

    /// Environment variables checked for the API key, in order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Provider::Anthropic => &["ANTHROPIC_API_KEY"],
            Provider::OpenAi => &["OPENAI_API_KEY"],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("Unknown provider '{}' (use gemini, anthropic or openai)", other)),
        }
    }
}

/// Expected quiz shape, checked after the model's JSON decodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSchema {
    #[serde(default = "default_mcq_count")]
    pub multiple_choice_count: usize,
    #[serde(default = "default_short_answer_count")]
    pub short_answer_count: usize,
    /// Reject quizzes whose question counts differ from the counts above
    #[serde(default = "default_true")]
    pub enforce_counts: bool,
}

fn default_mcq_count() -> usize {
    5
}

fn default_short_answer_count() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> Option<u64> {
    Some(120)
}

fn default_max_output_tokens() -> u32 {
    4096
}

impl Default for QuizSchema {
    fn default() -> Self {
        Self {
            multiple_choice_count: default_mcq_count(),
            short_answer_count: default_short_answer_count(),
            enforce_counts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub provider: Provider,
    /// Model override (None = provider default)
    #[serde(default)]
    pub model: Option<String>,
    /// Endpoint override, e.g. a proxy (None = provider's public API)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Transport timeout for one LLM call (None = no client timeout)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Cap on document characters sent to the model (None = whole document)
    #[serde(default)]
    pub max_document_chars: Option<usize>,
    #[serde(default)]
    pub quiz: QuizSchema,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            api_base: None,
            request_timeout_secs: default_timeout(),
            max_output_tokens: default_max_output_tokens(),
            max_document_chars: None,
            quiz: QuizSchema::default(),
        }
    }
}

/// Keys accepted by `get` / `set`
pub const KEYS: &[&str] = &[
    "provider",
    "model",
    "api-base",
    "request-timeout-secs",
    "max-output-tokens",
    "max-document-chars",
    "quiz-mcq-count",
    "quiz-short-answer-count",
    "quiz-enforce-counts",
];

impl Settings {
    /// Default location: `<data_dir>/studydeck/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE)
    }

    /// Load settings from disk or fall back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed settings file");
                Settings::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read settings file");
                Settings::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;

        let write_err = |source| SettingsError::Write {
            path: path.display().to_string(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)?;

        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Model to use for the configured provider
    pub fn effective_model(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn get(&self, key: &str) -> Result<String, SettingsError> {
        let value = match key {
            "provider" => self.provider.to_string(),
            "model" => self.effective_model(),
            "api-base" => self.api_base.clone().unwrap_or_else(|| "default".to_string()),
            "request-timeout-secs" => self
                .request_timeout_secs
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string()),
            "max-output-tokens" => self.max_output_tokens.to_string(),
            "max-document-chars" => self
                .max_document_chars
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string()),
            "quiz-mcq-count" => self.quiz.multiple_choice_count.to_string(),
            "quiz-short-answer-count" => self.quiz.short_answer_count.to_string(),
            "quiz-enforce-counts" => self.quiz.enforce_counts.to_string(),
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Update one key from its string form. "none" / "default" clear optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let cleared = matches!(value.trim(), "" | "none" | "default");

        match key {
            "provider" => self.provider = value.parse().map_err(|e: String| invalid(&e))?,
            "model" => self.model = (!cleared).then(|| value.trim().to_string()),
            "api-base" => self.api_base = (!cleared).then(|| value.trim().trim_end_matches('/').to_string()),
            "request-timeout-secs" => {
                self.request_timeout_secs = if cleared {
                    None
                } else {
                    Some(parse_positive(value).map_err(|e| invalid(&e))?)
                };
            }
            "max-output-tokens" => {
                self.max_output_tokens = parse_positive(value).map_err(|e| invalid(&e))?;
            }
            "max-document-chars" => {
                self.max_document_chars = if cleared {
                    None
                } else {
                    Some(parse_positive(value).map_err(|e| invalid(&e))?)
                };
            }
            "quiz-mcq-count" => self.quiz.multiple_choice_count = parse_positive(value).map_err(|e| invalid(&e))?,
            "quiz-short-answer-count" => {
                self.quiz.short_answer_count = parse_positive(value).map_err(|e| invalid(&e))?
            }
            "quiz-enforce-counts" => {
                self.quiz.enforce_counts = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| invalid("use true/false"))?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Non-zero integer that fits the target field
fn parse_positive<T: FromStr + Default + PartialEq>(value: &str) -> Result<T, String> {
    match value.trim().parse::<T>() {
        Ok(v) if v == T::default() => Err("must be greater than zero".to_string()),
        Ok(v) => Ok(v),
        Err(_) => Err("Invalid number or out of range".to_string()),
    }
}

/// Resolve the API key: explicit value first, then the provider's env vars
pub fn resolve_api_key(provider: Provider, explicit: Option<&str>) -> Option<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    provider
        .env_vars()
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Masked API key for display (shows first 8 / last 4 chars)
pub fn mask_key(key: &str) -> String {
    if key.len() > 12 && key.is_ascii() {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "*".repeat(key.chars().count())
    }
}
