//! Configuration for the ranking pipeline

use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// NSE India public site
pub const DEFAULT_NSE_BASE_URL: &str = "https://www.nseindia.com";

/// Index whose constituents form the symbol directory
pub const DEFAULT_LISTING_INDEX: &str = "SECURITIES IN F&O";

/// Model used for both extraction and summary
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Browser identity the exchange site expects
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Settings for language-model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Model identifier
    pub model: String,

    /// Sampling temperature for company extraction
    pub extraction_temperature: f32,

    /// Sampling seed for company extraction
    pub extraction_seed: u64,

    /// Optional cap on generated tokens
    pub max_tokens: Option<usize>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            extraction_temperature: 0.6,
            extraction_seed: 123,
            max_tokens: None,
        }
    }
}

/// Settings for the exchange client and fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Exchange site root; API paths hang off it
    pub base_url: String,

    /// Index listing used to build the symbol directory
    pub listing_index: String,

    /// User-Agent header sent on every request
    pub user_agent: String,

    /// Timeout for the cookie warm-up request
    pub session_timeout: Duration,

    /// Timeout for API requests
    pub request_timeout: Duration,

    /// Pause after a successful cookie warm-up
    pub session_settle: Duration,

    /// Pause between the end of one symbol's fetch and the start of the next
    pub symbol_delay: Duration,

    /// Ceiling on API requests per second; zero disables the limiter
    pub max_requests_per_second: u32,

    /// Attempt budget and backoff for history requests
    pub retry: RetryPolicy,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NSE_BASE_URL.to_string(),
            listing_index: DEFAULT_LISTING_INDEX.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            session_settle: Duration::from_secs(1),
            symbol_delay: Duration::from_secs(1),
            max_requests_per_second: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl MarketConfig {
    /// No pauses anywhere; for tests and offline runs
    pub fn without_delays() -> Self {
        Self {
            session_settle: Duration::ZERO,
            symbol_delay: Duration::ZERO,
            max_requests_per_second: 0,
            retry: RetryPolicy::immediate(3),
            ..Self::default()
        }
    }
}

/// Configuration for the ranking pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Lookback used when the query names no period
    pub default_lookback_months: u32,

    /// Language-model settings
    pub llm: LlmSettings,

    /// Exchange settings
    pub market: MarketConfig,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            default_lookback_months: 3,
            llm: LlmSettings::default(),
            market: MarketConfig::default(),
        }
    }
}

impl RankerConfig {
    /// Create a new configuration builder
    pub fn builder() -> RankerConfigBuilder {
        RankerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_lookback_months == 0 {
            return Err(StockError::ConfigError(
                "default_lookback_months must be greater than 0".to_string(),
            ));
        }

        if self.market.retry.max_attempts == 0 {
            return Err(StockError::ConfigError(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        if !self.market.base_url.starts_with("http") {
            return Err(StockError::ConfigError(format!(
                "base_url must be an http(s) URL, got {}",
                self.market.base_url
            )));
        }

        Ok(())
    }
}

/// Builder for RankerConfig
#[derive(Debug, Default)]
pub struct RankerConfigBuilder {
    default_lookback_months: Option<u32>,
    llm: Option<LlmSettings>,
    market: Option<MarketConfig>,
    model: Option<String>,
    base_url: Option<String>,
}

impl RankerConfigBuilder {
    /// Set the default lookback in months
    pub fn default_lookback_months(mut self, months: u32) -> Self {
        self.default_lookback_months = Some(months);
        self
    }

    /// Replace the language-model settings
    pub fn llm(mut self, llm: LlmSettings) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Replace the exchange settings
    pub fn market(mut self, market: MarketConfig) -> Self {
        self.market = Some(market);
        self
    }

    /// Override only the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override only the exchange base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Read `LLM_MODEL`, `NSE_BASE_URL` and `RANKER_LOOKBACK_MONTHS` from the environment
    pub fn with_env(self) -> Self {
        self.with_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::with_env`] with an arbitrary variable lookup
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(model) = lookup("LLM_MODEL").filter(|v| !v.is_empty()) {
            self.model = Some(model);
        }
        if let Some(url) = lookup("NSE_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(months) = lookup("RANKER_LOOKBACK_MONTHS").and_then(|v| v.parse().ok()) {
            self.default_lookback_months = Some(months);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RankerConfig> {
        let mut llm = self.llm.unwrap_or_default();
        if let Some(model) = self.model {
            llm.model = model;
        }

        let mut market = self.market.unwrap_or_default();
        if let Some(url) = self.base_url {
            market.base_url = url.trim_end_matches('/').to_string();
        }

        let config = RankerConfig {
            default_lookback_months: self
                .default_lookback_months
                .unwrap_or(RankerConfig::default().default_lookback_months),
            llm,
            market,
        };

        config.validate()?;
        Ok(config)
    }
}
