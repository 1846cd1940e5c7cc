//! Hosted LLM clients
//!
//! One prompt in, one free-form text reply out. Gemini, Anthropic and OpenAI
//! sit behind the `LlmClient` trait. A client is built fresh for every run
//! from the caller's credential and is never pooled or cached.

use crate::error::LlmError;
use crate::settings::{Provider, Settings};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Token counts reported by the provider, when it reports them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Text of one completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// The LLM boundary. One call is one request; there are no retries here.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<LlmReply, LlmError>;
}

/// Build a client for `provider`. An empty credential fails here, before any
/// document work starts.
pub fn build_client(
    provider: Provider,
    api_key: &str,
    settings: &Settings,
) -> Result<Box<dyn LlmClient>, LlmError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(LlmError::MissingCredential {
            provider: provider.as_str(),
        });
    }

    let http = http_client(settings.request_timeout_secs)?;
    let model = match &settings.model {
        Some(m) if !m.trim().is_empty() => m.trim().to_string(),
        _ => provider.default_model().to_string(),
    };
    let base = |default: &str| {
        settings
            .api_base
            .clone()
            .unwrap_or_else(|| default.to_string())
            .trim_end_matches('/')
            .to_string()
    };
    let endpoint = Endpoint {
        http,
        api_key: api_key.to_string(),
        model,
        max_output_tokens: settings.max_output_tokens,
    };

    let client: Box<dyn LlmClient> = match provider {
        Provider::Gemini => Box::new(GeminiClient {
            endpoint,
            base_url: base(GEMINI_API_BASE),
        }),
        Provider::Anthropic => Box::new(AnthropicClient {
            endpoint,
            base_url: base(ANTHROPIC_API_BASE),
        }),
        Provider::OpenAi => Box::new(OpenAiClient {
            endpoint,
            base_url: base(OPENAI_API_BASE),
        }),
    };

    tracing::debug!(provider = %provider, model = client.model(), "Built LLM client");
    Ok(client)
}

fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("studydeck/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| LlmError::ClientBuild(e.to_string()))
}

/// Connection details shared by every provider
struct Endpoint {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_output_tokens: u32,
}

/// Send a JSON request and decode the JSON body, mapping non-2xx to `Status`
async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, LlmError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status { status, body });
    }

    Ok(response.json::<T>().await?)
}

fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text)
    }
}

// ==================== Gemini ====================

struct GeminiClient {
    endpoint: Endpoint,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl GeminiResponse {
    fn into_reply(self) -> Result<LlmReply, LlmError> {
        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            tracing::warn!(reason, "Gemini blocked the prompt");
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(LlmReply {
            text: non_empty(text)?,
            usage: self.usage_metadata.map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            }),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn complete(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.endpoint.max_output_tokens,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.endpoint.model);
        let response: GeminiResponse = send_json(
            self.endpoint
                .http
                .post(&url)
                .header("x-goog-api-key", &self.endpoint.api_key)
                .json(&request),
        )
        .await?;

        response.into_reply()
    }
}

// ==================== Anthropic ====================

struct AnthropicClient {
    endpoint: Endpoint,
    base_url: String,
}

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicResponse {
    fn into_reply(self) -> Result<LlmReply, LlmError> {
        let text: String = self.content.into_iter().filter_map(|block| block.text).collect();
        Ok(LlmReply {
            text: non_empty(text)?,
            usage: self.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn complete(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        let request = AnthropicRequest {
            model: self.endpoint.model.clone(),
            max_tokens: self.endpoint.max_output_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response: AnthropicResponse = send_json(
            self.endpoint
                .http
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.endpoint.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        response.into_reply()
    }
}

// ==================== OpenAI ====================

struct OpenAiClient {
    endpoint: Endpoint,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageContent,
}

#[derive(Deserialize)]
struct OpenAIMessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAIResponse {
    fn into_reply(self) -> Result<LlmReply, LlmError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(LlmReply {
            text: non_empty(text)?,
            usage: self.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn complete(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        let request = OpenAIRequest {
            model: self.endpoint.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.endpoint.max_output_tokens,
        };

        let response: OpenAIResponse = send_json(
            self.endpoint
                .http
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.endpoint.api_key))
                .json(&request),
        )
        .await?;

        response.into_reply()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_rejects_blank_key() {
        let settings = Settings::default();
        let err = build_client(Provider::Gemini, "   ", &settings).err().unwrap();
        assert!(matches!(err, LlmError::MissingCredential { provider: "gemini" }));
    }

    #[test]
    fn test_build_client_uses_settings_model() {
        let mut settings = Settings::default();
        settings.model = Some("claude-sonnet-4-5".to_string());
        let client = build_client(Provider::Anthropic, "sk-test", &settings).unwrap();
        assert_eq!(client.provider(), Provider::Anthropic);
        assert_eq!(client.model(), "claude-sonnet-4-5");

        let client = build_client(Provider::OpenAi, "sk-test", &Settings::default()).unwrap();
        assert_eq!(client.model(), "gpt-4o");
    }

    #[test]
    fn test_gemini_response_joins_parts() {
        let json = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Summary: "}, {"text": "done"}]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 30}
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.text, "Summary: done");
        assert_eq!(reply.usage, Some(TokenUsage { input_tokens: 120, output_tokens: 30 }));
    }

    #[test]
    fn test_gemini_blocked_prompt_is_empty_response() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_reply(), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_anthropic_response_text() {
        let json = r#"{"content": [{"type": "text", "text": "{\"a\": 1}"}], "usage": {"input_tokens": 5, "output_tokens": 7}}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.text, "{\"a\": 1}");
        assert_eq!(reply.usage.unwrap().output_tokens, 7);
    }

    #[test]
    fn test_openai_response_without_content_is_empty() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: OpenAIResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_reply(), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: Some("hi".to_string()) }],
            }],
            generation_config: GeminiGenerationConfig { max_output_tokens: 64 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 64);
    }
}
