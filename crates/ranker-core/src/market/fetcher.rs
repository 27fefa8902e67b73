//! Per-symbol history fetch with retry and pacing

use super::{MarketDataSource, PricePoint};
use crate::config::MarketConfig;
use crate::error::{Result, StockError};
use crate::query::AnalysisPeriod;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Fetches daily history one symbol at a time
///
/// Every attempt refreshes the session, checks the symbol still resolves and
/// then requests the series. Transient failures are retried per the
/// [`RetryPolicy`]; whatever still fails is logged and reported as `None`.
///
/// Successive fetches are separated by `symbol_delay`, measured from the end
/// of one fetch to the start of the next.
pub struct MarketDataFetcher {
    source: Arc<dyn MarketDataSource>,
    retry: RetryPolicy,
    symbol_delay: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl MarketDataFetcher {
    /// Fetcher using the retry policy and symbol delay from `config`
    pub fn new(source: Arc<dyn MarketDataSource>, config: &MarketConfig) -> Self {
        Self {
            source,
            retry: config.retry.clone(),
            symbol_delay: config.symbol_delay,
            last_finished: Mutex::new(None),
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Daily closes for `symbol`, or `None` once every attempt has failed
    pub async fn fetch(&self, symbol: &str, period: &AnalysisPeriod) -> Option<Vec<PricePoint>> {
        let mut last_finished = self.last_finished.lock().await;
        if let Some(finished) = *last_finished {
            let resume = finished + self.symbol_delay;
            if resume > Instant::now() {
                debug!("Pausing {:?} before {}", self.symbol_delay, symbol);
                tokio::time::sleep_until(resume).await;
            }
        }

        let operation = format!("history for {symbol}");
        let outcome = self
            .retry
            .execute(&operation, || self.attempt(symbol, period))
            .await;
        *last_finished = Some(Instant::now());

        match outcome {
            Ok(points) => {
                info!("Fetched {} daily closes for {}", points.len(), symbol);
                Some(points)
            }
            Err(e) => {
                warn!("No data for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn attempt(&self, symbol: &str, period: &AnalysisPeriod) -> Result<Vec<PricePoint>> {
        self.source.refresh_session().await?;

        if !self.source.resolve_symbol(symbol).await? {
            return Err(StockError::InvalidSymbol(symbol.to_string()));
        }

        let points = self.source.daily_history(symbol, period).await?;
        if points.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no rows between {period}"),
            });
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::ListingEntry;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` history calls with a 503
    #[derive(Default)]
    struct FlakySource {
        failures: u32,
        known: bool,
        empty: bool,
        refreshes: AtomicU32,
        history_calls: AtomicU32,
    }

    #[async_trait]
    impl MarketDataSource for FlakySource {
        async fn refresh_session(&self) -> Result<()> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn resolve_symbol(&self, _symbol: &str) -> Result<bool> {
            Ok(self.known)
        }

        async fn daily_history(
            &self,
            _symbol: &str,
            _period: &AnalysisPeriod,
        ) -> Result<Vec<PricePoint>> {
            let call = self.history_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(StockError::HttpStatus {
                    status: 503,
                    url: "https://nse.test/api/historical/cm/equity".to_string(),
                });
            }
            if self.empty {
                return Ok(Vec::new());
            }
            Ok(vec![PricePoint::new(
                NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
                100.0,
            )])
        }

        async fn listing(&self) -> Result<Vec<ListingEntry>> {
            Ok(Vec::new())
        }
    }

    fn period() -> AnalysisPeriod {
        AnalysisPeriod::ending(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 3)
    }

    fn fetcher(source: Arc<FlakySource>) -> MarketDataFetcher {
        MarketDataFetcher::new(source, &MarketConfig::without_delays())
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let source = Arc::new(FlakySource {
            failures: 2,
            known: true,
            ..FlakySource::default()
        });

        let points = fetcher(Arc::clone(&source)).fetch("RELIANCE", &period()).await;
        assert_eq!(points.map(|p| p.len()), Some(1));
        assert_eq!(source.history_calls.load(Ordering::SeqCst), 3);
        // session is re-established on every attempt
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_three_failures_give_no_data() {
        let source = Arc::new(FlakySource {
            failures: 3,
            known: true,
            ..FlakySource::default()
        });

        let points = fetcher(Arc::clone(&source)).fetch("RELIANCE", &period()).await;
        assert!(points.is_none());
        assert_eq!(source.history_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_symbol_not_retried() {
        let source = Arc::new(FlakySource::default());

        let points = fetcher(Arc::clone(&source)).fetch("NOPE", &period()).await;
        assert!(points.is_none());
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(source.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_history_not_retried() {
        let source = Arc::new(FlakySource {
            known: true,
            empty: true,
            ..FlakySource::default()
        });

        let points = fetcher(Arc::clone(&source)).fetch("RELIANCE", &period()).await;
        assert!(points.is_none());
        assert_eq!(source.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_retry_budget() {
        let source = Arc::new(FlakySource {
            failures: 1,
            known: true,
            ..FlakySource::default()
        });

        let points = fetcher(Arc::clone(&source))
            .with_retry(RetryPolicy::no_retry())
            .fetch("RELIANCE", &period())
            .await;
        assert!(points.is_none());
    }

    /// Records when each fetch starts and ends; the session warm-up is slow
    #[derive(Default)]
    struct TimedSource {
        warm_up: Duration,
        starts: Mutex<Vec<Instant>>,
        ends: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl MarketDataSource for TimedSource {
        async fn refresh_session(&self) -> Result<()> {
            self.starts.lock().await.push(Instant::now());
            tokio::time::sleep(self.warm_up).await;
            Ok(())
        }

        async fn resolve_symbol(&self, _symbol: &str) -> Result<bool> {
            Ok(true)
        }

        async fn daily_history(
            &self,
            _symbol: &str,
            _period: &AnalysisPeriod,
        ) -> Result<Vec<PricePoint>> {
            self.ends.lock().await.push(Instant::now());
            Ok(vec![PricePoint::new(
                NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
                100.0,
            )])
        }

        async fn listing(&self) -> Result<Vec<ListingEntry>> {
            Ok(Vec::new())
        }
    }

    fn paced(source: Arc<TimedSource>, symbol_delay: Duration) -> MarketDataFetcher {
        let config = MarketConfig {
            symbol_delay,
            ..MarketConfig::without_delays()
        };
        MarketDataFetcher::new(source, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_symbol_delay_follows_previous_fetch() {
        // the warm-up alone outlasts the delay
        let source = Arc::new(TimedSource {
            warm_up: Duration::from_millis(300),
            ..TimedSource::default()
        });
        let fetcher = paced(Arc::clone(&source), Duration::from_millis(250));

        assert!(fetcher.fetch("RELIANCE", &period()).await.is_some());
        assert!(fetcher.fetch("ONGC", &period()).await.is_some());

        let starts = source.starts.lock().await;
        let ends = source.ends.lock().await;
        assert!(starts[1] - ends[0] >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_not_delayed() {
        let source = Arc::new(TimedSource::default());
        let fetcher = paced(Arc::clone(&source), Duration::from_secs(1));
        let begun = Instant::now();

        fetcher.fetch("RELIANCE", &period()).await;

        assert!(source.starts.lock().await[0] - begun < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_runs_back_to_back() {
        let source = Arc::new(TimedSource::default());
        let fetcher = paced(Arc::clone(&source), Duration::ZERO);

        fetcher.fetch("RELIANCE", &period()).await;
        fetcher.fetch("ONGC", &period()).await;

        let starts = source.starts.lock().await;
        let ends = source.ends.lock().await;
        assert_eq!(starts[1], ends[0]);
    }
}
