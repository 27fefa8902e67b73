//! Error types for chat-completion calls

use thiserror::Error;

/// Result type for chat-completion calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Failures talking to a chat-completion service
#[derive(Error, Debug)]
pub enum LLMError {
    /// Non-success status without a more specific variant
    #[error("model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The service refused the API key (401)
    #[error("API key rejected by the model service")]
    AuthenticationFailed,

    /// Too many requests (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The service rejected the request body (400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown model name (404)
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport failure or timeout
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The reply did not have the chat-completion shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Missing key or bad provider settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Map an HTTP error status from the service to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            400 => Self::InvalidRequest(body),
            401 => Self::AuthenticationFailed,
            404 => Self::ModelNotFound(model.to_string()),
            429 => Self::RateLimitExceeded(body),
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }
}
