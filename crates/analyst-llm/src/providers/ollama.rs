//! Native Ollama provider implementation
//!
//! Uses the non-streaming `/api/chat` endpoint.
//! See: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use super::with_system;
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, ResponseFormat, Result,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
// Local models on modest hardware routinely need minutes per answer.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server root, without the `/api` suffix
    pub base_url: String,

    /// Request timeout in seconds (default: 300)
    pub timeout_secs: u64,
}

impl OllamaConfig {
    /// Create a config pointing at the given server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_BASE_URL)
    }
}

/// Ollama chat provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider for the given server with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(OllamaConfig::new(base_url))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    #[instrument(
        skip(self, request),
        fields(model = %request.model, base_url = %self.config.base_url)
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending chat request to Ollama at {}", self.config.base_url);

        let model = request.model.clone();
        let ollama_request = build_request(request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status, error_text, &model));
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        Ok(parse_response(ollama_response, &model))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// ============================================================================
// Ollama wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    message: Option<OllamaMessage>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

fn build_request(request: CompletionRequest) -> OllamaRequest {
    let messages = with_system(request.system, request.messages)
        .into_iter()
        .map(|m| OllamaMessage {
            role: m.role.as_str().to_string(),
            content: m.content,
        })
        .collect();

    OllamaRequest {
        model: request.model,
        messages,
        stream: false,
        format: match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some("json"),
        },
        options: OllamaOptions {
            num_predict: request.max_tokens,
            temperature: request.temperature,
        },
    }
}

fn parse_response(response: OllamaResponse, requested_model: &str) -> CompletionResponse {
    let usage = TokenUsage {
        input_tokens: response.prompt_eval_count.unwrap_or(0),
        output_tokens: response.eval_count.unwrap_or(0),
    };
    let done_reason = response.done_reason.unwrap_or_default();

    debug!(
        "Received response - done_reason: {}, tokens: {}/{}",
        done_reason, usage.input_tokens, usage.output_tokens
    );

    CompletionResponse {
        message: Message::assistant(response.message.map(|m| m.content).unwrap_or_default()),
        model: response.model.unwrap_or_else(|| requested_model.to_string()),
        stop_reason: StopReason::from_finish_reason(&done_reason),
        usage,
    }
}
