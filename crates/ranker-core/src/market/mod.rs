//! Market data access
//!
//! [`MarketDataSource`] is the seam to the exchange: the live implementation
//! is [`NseClient`], tests substitute in-memory fakes. [`MarketDataFetcher`]
//! layers the retry policy and inter-symbol pacing on top of any source.
//! Payload parsing lives here as plain functions so it can be exercised
//! without a network.

pub mod fetcher;
pub mod nse;

pub use fetcher::MarketDataFetcher;
pub use nse::NseClient;

use crate::error::Result;
use crate::query::AnalysisPeriod;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One row of a daily series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// One constituent of an index listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub symbol: String,
    pub company_name: String,
}

/// Upstream exchange operations the pipeline depends on
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Drop any session state and establish a fresh one
    async fn refresh_session(&self) -> Result<()>;

    /// Whether the exchange still resolves `symbol`
    async fn resolve_symbol(&self, symbol: &str) -> Result<bool>;

    /// Daily closes for `symbol` over `period`, in upstream order
    async fn daily_history(&self, symbol: &str, period: &AnalysisPeriod)
    -> Result<Vec<PricePoint>>;

    /// Constituents of the configured index
    async fn listing(&self) -> Result<Vec<ListingEntry>>;
}

/// Extract price points from a history payload
///
/// Expects `{"data": [{"CH_TIMESTAMP": .., "CH_CLOSING_PRICE": ..}, ..]}`.
/// Rows with an unreadable date or price are skipped; a missing `data`
/// array yields an empty series.
pub fn parse_history(payload: &Value) -> Vec<PricePoint> {
    let Some(rows) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let date = row.get("CH_TIMESTAMP").and_then(Value::as_str).and_then(parse_trade_date);
            let close = row.get("CH_CLOSING_PRICE").and_then(parse_price);
            match (date, close) {
                (Some(date), Some(close)) => Some(PricePoint::new(date, close)),
                _ => {
                    warn!("Skipping unreadable history row: {}", row);
                    None
                }
            }
        })
        .collect()
}

/// Extract `(symbol, companyName)` pairs from an index listing payload
///
/// Rows without a `meta` object (the index summary row) are skipped.
pub fn parse_listing(payload: &Value) -> Vec<ListingEntry> {
    let Some(rows) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let meta = row.get("meta")?;
            let symbol = meta.get("symbol")?.as_str()?;
            let company_name = meta.get("companyName")?.as_str()?;
            Some(ListingEntry {
                symbol: symbol.to_string(),
                company_name: company_name.to_string(),
            })
        })
        .collect()
}

fn parse_trade_date(raw: &str) -> Option<NaiveDate> {
    // "2024-06-14T18:30:00.000+00:00" or plain "2024-06-14"
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%d-%b-%Y").ok())
}

fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
    .filter(|price: &f64| price.is_finite())
}
