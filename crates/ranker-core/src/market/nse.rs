//! NSE India client
//!
//! The exchange's JSON API only answers browsers that first visited the site
//! root and picked up its session cookies. A session refresh therefore builds
//! a fresh `reqwest::Client` with an empty cookie store and warms it up
//! against the root; API calls then reuse that client and send the root as
//! referer. Every outbound request waits on a shared rate limiter so a long
//! batch stays under the exchange's throttling threshold.

use super::{ListingEntry, MarketDataSource, PricePoint, parse_history, parse_listing};
use crate::config::MarketConfig;
use crate::error::{Result, StockError};
use crate::query::AnalysisPeriod;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const QUOTE_PATH: &str = "/api/quote-equity";
const HISTORY_PATH: &str = "/api/historical/cm/equity";
const LISTING_PATH: &str = "/api/equity-stockIndices";

/// Equity series requested from the history endpoint
const EQUITY_SERIES: &str = r#"["EQ"]"#;

const ACCEPT_VALUE: &str = "application/json,text/html,application/xhtml+xml,application/xml;q=0.9,\
     image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Cookie-session client for the NSE public API
///
/// Each instance owns its own session; construct one per request when
/// serving concurrent callers.
pub struct NseClient {
    config: MarketConfig,
    client: RwLock<Client>,
    rate_limiter: Option<SharedRateLimiter>,
}

impl fmt::Debug for NseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NseClient")
            .field("base_url", &self.config.base_url)
            .field("max_requests_per_second", &self.config.max_requests_per_second)
            .finish_non_exhaustive()
    }
}

impl NseClient {
    /// Create a client; no request is made until the first call
    pub fn new(config: MarketConfig) -> Result<Self> {
        let client = build_client(&config)?;
        let rate_limiter = request_limiter(config.max_requests_per_second);
        Ok(Self {
            config,
            client: RwLock::new(client),
            rate_limiter,
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.throttle().await;
        let client = self.client.read().await.clone();
        let url = self.url(path);

        let response = client
            .get(&url)
            .header(REFERER, &self.config.base_url)
            .query(query)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StockError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl MarketDataSource for NseClient {
    #[instrument(skip(self))]
    async fn refresh_session(&self) -> Result<()> {
        let client = build_client(&self.config)?;

        self.throttle().await;
        let response = client
            .get(&self.config.base_url)
            .timeout(self.config.session_timeout)
            .send()
            .await
            .map_err(|e| StockError::Session(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(StockError::Session(format!(
                "{} answered {}",
                self.config.base_url,
                response.status()
            )));
        }

        *self.client.write().await = client;
        debug!("Session cookies refreshed");

        settle(self.config.session_settle).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resolve_symbol(&self, symbol: &str) -> Result<bool> {
        match self.get_json(QUOTE_PATH, &[("symbol", symbol)]).await {
            Ok(quote) => Ok(quote.as_object().is_some_and(|fields| !fields.is_empty())),
            Err(e) => {
                debug!("Quote lookup for {} failed: {}", symbol, e);
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, period), fields(from = %period.nse_from(), to = %period.nse_to()))]
    async fn daily_history(
        &self,
        symbol: &str,
        period: &AnalysisPeriod,
    ) -> Result<Vec<PricePoint>> {
        let from = period.nse_from();
        let to = period.nse_to();
        let payload = self
            .get_json(
                HISTORY_PATH,
                &[
                    ("symbol", symbol),
                    ("series", EQUITY_SERIES),
                    ("from", from.as_str()),
                    ("to", to.as_str()),
                ],
            )
            .await?;

        let points = parse_history(&payload);
        debug!("Received {} rows for {}", points.len(), symbol);
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn listing(&self) -> Result<Vec<ListingEntry>> {
        let payload = self
            .get_json(LISTING_PATH, &[("index", self.config.listing_index.as_str())])
            .await?;
        let entries = parse_listing(&payload);
        info!(
            "Index '{}' lists {} constituents",
            self.config.listing_index,
            entries.len()
        );
        Ok(entries)
    }
}

fn build_client(config: &MarketConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| StockError::ConfigError(format!("invalid user agent: {e}")))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Ok(Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .build()?)
}

/// `per_second` permits a second; `None` when zero
fn request_limiter(per_second: u32) -> Option<SharedRateLimiter> {
    NonZeroU32::new(per_second).map(|n| Arc::new(RateLimiter::direct(Quota::per_second(n))))
}

async fn settle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}
