//! Error types for the ranking pipeline

use thiserror::Error;

/// Stock ranking specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Could not establish a browsing session with the exchange site
    #[error("Session refresh failed: {0}")]
    Session(String),

    /// The exchange no longer resolves this symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The model's company extraction did not have the expected shape
    #[error("Extraction response malformed: {0}")]
    Extraction(String),

    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(#[from] ranker_llm::LLMError),

    /// Prompt template failed to render
    #[error("Prompt error: {0}")]
    Prompt(#[from] minijinja::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StockError {
    /// Whether a market-data call failing with this error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Session(_) | Self::NetworkError(_) | Self::JsonError(_)
        )
    }
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;
