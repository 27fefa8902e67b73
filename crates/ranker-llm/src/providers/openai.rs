//! OpenAI-compatible chat-completion provider
//!
//! Groq, OpenAI and local servers (llama.cpp, vLLM, LM Studio) all speak the
//! same `/chat/completions` dialect, so one provider covers them. The default
//! base URL points at Groq, which hosts the Llama models the ranker uses.
//!
//! # Example
//!
//! ```no_run
//! use ranker_llm::{CompletionRequest, Message, LLMProvider};
//! use ranker_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::with_config(OpenAIConfig::from_env()?)?;
//!
//!     let request = CompletionRequest::builder("llama3-8b-8192")
//!         .add_message(Message::user("Hello!"))
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, ResponseFormat, Result,
    Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables checked, in order, for the API key
const API_KEY_VARS: [&str; 3] = ["GROQ_API_KEY", "LLM_API_KEY", "OPENAI_API_KEY"];

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL of the chat-completions API
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Name reported by [`LLMProvider::name`]
    pub provider_name: String,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from the process environment
    ///
    /// The key comes from `GROQ_API_KEY`, `LLM_API_KEY` or `OPENAI_API_KEY`
    /// (first one set wins); `LLM_API_BASE` overrides the base URL.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                LLMError::ConfigurationError(format!(
                    "none of {} is set",
                    API_KEY_VARS.join(", ")
                ))
            })?;

        let mut config = Self::new(api_key);
        if let Some(api_base) = lookup("LLM_API_BASE").filter(|v| !v.is_empty()) {
            config.api_base = api_base;
        }
        Ok(config)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the provider name used in logs
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            provider_name: "groq".to_string(),
        }
    }
}

/// OpenAI-compatible chat-completion provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LLMError::ConfigurationError(
                "API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = ChatRequest::from(request);

        debug!("Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(LLMError::from_status(status.as_u16(), error_text, &model));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        chat.try_into()
    }

    fn name(&self) -> &str {
        &self.config.provider_name
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ChatResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl From<CompletionRequest> for ChatRequest {
    fn from(request: CompletionRequest) -> Self {
        let messages = request
            .messages
            .into_iter()
            .map(|m: Message| ChatMessage {
                role: m.role.as_str(),
                content: m.content.unwrap_or_default(),
            })
            .collect();

        let response_format = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(ChatResponseFormat {
                format_type: "json_object",
            }),
        };

        Self {
            model: request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            seed: request.seed,
            response_format,
            stop: request.stop_sequences,
        }
    }
}

impl TryFrom<ChatResponse> for CompletionResponse {
    type Error = LLMError;

    fn try_from(chat: ChatResponse) -> Result<Self> {
        let usage = chat.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));
        debug!(
            ?stop_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Received chat completion"
        );

        Ok(CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: choice.message.content,
            },
            stop_reason,
            usage,
        })
    }
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}
