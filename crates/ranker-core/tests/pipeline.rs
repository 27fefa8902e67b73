//! End-to-end pipeline runs against a scripted model and exchange

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use mockall::mock;
use ranker_core::pipeline::{NO_DATA, NO_SYMBOLS};
use ranker_core::{
    AnalysisOutcome, AnalysisPeriod, ListingEntry, MarketConfig, MarketDataSource, PricePoint,
    RankerConfig, RankingPipeline, Result, StockError, SymbolDirectory,
};
use ranker_llm::{CompletionRequest, CompletionResponse, LLMProvider, ResponseFormat};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

mock! {
    Provider {}

    #[async_trait]
    impl LLMProvider for Provider {
        async fn complete(&self, request: CompletionRequest) -> ranker_llm::Result<CompletionResponse>;
        fn name(&self) -> &str;
    }
}

const SUMMARY: &str = "HINDPETRO led the group; ONGC lagged.";

/// Model that answers the extraction call with `extraction` and the summary
/// call with [`SUMMARY`]
fn provider(extraction: &'static str, expected_calls: usize) -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_name().return_const("mock".to_string());
    provider
        .expect_complete()
        .times(expected_calls)
        .returning(move |request: CompletionRequest| {
            let text = match request.response_format {
                ResponseFormat::JsonObject => extraction,
                ResponseFormat::Text => SUMMARY,
            };
            Ok(CompletionResponse::from_text(text))
        });
    provider
}

enum Script {
    /// Answers with this series
    Series(Vec<PricePoint>),
    /// Upstream errors on every history call
    AlwaysFailing,
    /// Quote lookup does not resolve
    Delisted,
}

/// Exchange double keyed by symbol
#[derive(Default)]
struct ScriptedExchange {
    scripts: HashMap<&'static str, Script>,
    history_calls: Mutex<HashMap<String, u32>>,
    periods: Mutex<Vec<AnalysisPeriod>>,
    refreshes: AtomicU32,
}

impl ScriptedExchange {
    fn with(mut self, symbol: &'static str, script: Script) -> Self {
        self.scripts.insert(symbol, script);
        self
    }

    fn history_calls(&self, symbol: &str) -> u32 {
        self.history_calls
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MarketDataSource for ScriptedExchange {
    async fn refresh_session(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resolve_symbol(&self, symbol: &str) -> Result<bool> {
        Ok(!matches!(self.scripts.get(symbol), None | Some(Script::Delisted)))
    }

    async fn daily_history(&self, symbol: &str, period: &AnalysisPeriod) -> Result<Vec<PricePoint>> {
        *self
            .history_calls
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default() += 1;
        self.periods.lock().unwrap().push(*period);

        match self.scripts.get(symbol) {
            Some(Script::Series(points)) => Ok(points.clone()),
            _ => Err(StockError::HttpStatus {
                status: 503,
                url: format!("https://nse.test/api/historical/cm/equity?symbol={symbol}"),
            }),
        }
    }

    async fn listing(&self) -> Result<Vec<ListingEntry>> {
        Ok(directory_entries()
            .into_iter()
            .map(|(symbol, company_name)| ListingEntry {
                symbol: symbol.to_string(),
                company_name: company_name.to_string(),
            })
            .collect())
    }
}

fn directory_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("RELIANCE", "Reliance Industries Limited"),
        ("ONGC", "Oil & Natural Gas Corporation Limited"),
        ("IOC", "Indian Oil Corporation Limited"),
        ("HINDPETRO", "Hindustan Petroleum Corporation Limited"),
        ("OIL", "Oil India Limited"),
    ]
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// Friday closes compounding by `weekly` per week, ending near `today()`
fn compounding(weekly: f64) -> Vec<PricePoint> {
    let first_friday = NaiveDate::from_ymd_opt(2024, 3, 22).unwrap();
    (0..12)
        .map(|week| {
            PricePoint::new(
                first_friday + Duration::weeks(week),
                100.0 * (1.0 + weekly).powi(week as i32),
            )
        })
        .collect()
}

fn config() -> RankerConfig {
    RankerConfig::builder()
        .market(MarketConfig::without_delays())
        .build()
        .unwrap()
}

fn pipeline(provider: MockProvider, exchange: Arc<ScriptedExchange>) -> RankingPipeline {
    RankingPipeline::new(
        Arc::new(provider),
        exchange,
        Arc::new(SymbolDirectory::from_entries(directory_entries())),
        &config(),
    )
}

#[tokio::test]
async fn ranks_by_average_weekly_return() {
    let exchange = Arc::new(
        ScriptedExchange::default()
            .with("RELIANCE", Script::Series(compounding(0.025)))
            .with("HINDPETRO", Script::Series(compounding(0.05)))
            .with("IOC", Script::Series(compounding(-0.01))),
    );
    let extraction = r#"{"matches": [
        {"description": "Reliance Industries"},
        {"description": "Hindustan Petroleum"},
        {"description": "Indian Oil"}
    ]}"#;

    let outcome = pipeline(provider(extraction, 2), Arc::clone(&exchange))
        .analyze_at("rank Reliance, HPCL and IOC", today())
        .await
        .unwrap();

    let report = outcome.report().expect("ranked outcome");
    assert_eq!(report.rankings.symbols(), vec!["HINDPETRO", "RELIANCE", "IOC"]);

    let averages: Vec<f64> = report
        .rankings
        .iter()
        .map(|c| c.metrics.avg_weekly_return.unwrap())
        .collect();
    assert!((averages[0] - 5.0).abs() < 1e-9);
    assert!((averages[1] - 2.5).abs() < 1e-9);
    assert!((averages[2] + 1.0).abs() < 1e-9);

    assert_eq!(report.summary, SUMMARY);
    assert!(report.table.contains("HINDPETRO"));
    assert!(report.unmatched.is_empty());
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn failing_symbol_is_skipped_after_three_attempts() {
    let exchange = Arc::new(
        ScriptedExchange::default()
            .with("RELIANCE", Script::Series(compounding(0.01)))
            .with("ONGC", Script::AlwaysFailing),
    );
    let extraction = r#"{"matches": [
        {"description": "Reliance"},
        {"description": "Oil & Natural Gas"},
        {"description": "Tata Motors"}
    ]}"#;

    let outcome = pipeline(provider(extraction, 2), Arc::clone(&exchange))
        .analyze_at("Reliance vs ONGC vs Tata Motors", today())
        .await
        .unwrap();

    let report = outcome.report().expect("ranked outcome");
    assert_eq!(report.rankings.symbols(), vec!["RELIANCE"]);
    assert_eq!(report.skipped, vec!["ONGC"]);
    assert_eq!(report.unmatched, vec!["Tata Motors"]);
    assert_eq!(exchange.history_calls("ONGC"), 3);
    assert_eq!(exchange.history_calls("RELIANCE"), 1);
}

#[tokio::test]
async fn delisted_symbol_is_not_retried() {
    let exchange = Arc::new(
        ScriptedExchange::default()
            .with("RELIANCE", Script::Series(compounding(0.01)))
            .with("OIL", Script::Delisted),
    );
    let extraction = r#"{"matches": [{"description": "Oil India"}, {"description": "Reliance"}]}"#;

    let outcome = pipeline(provider(extraction, 2), Arc::clone(&exchange))
        .analyze_at("Oil India and Reliance", today())
        .await
        .unwrap();

    let report = outcome.report().expect("ranked outcome");
    assert_eq!(report.skipped, vec!["OIL"]);
    assert_eq!(exchange.history_calls("OIL"), 0);
}

#[tokio::test]
async fn lookback_comes_from_the_query() {
    let exchange =
        Arc::new(ScriptedExchange::default().with("RELIANCE", Script::Series(compounding(0.01))));
    let extraction = r#"{"matches": [{"description": "Reliance"}]}"#;

    let outcome = pipeline(provider(extraction, 2), Arc::clone(&exchange))
        .analyze_at("Reliance over the last 6 months", today())
        .await
        .unwrap();

    let period = outcome.report().expect("ranked outcome").period;
    assert_eq!(period.months, 6);
    assert_eq!(period.nse_from(), "15-12-2023");
    assert_eq!(period.nse_to(), "15-06-2024");
    assert_eq!(exchange.periods.lock().unwrap()[0], period);
}

#[tokio::test]
async fn default_lookback_is_three_months() {
    let exchange =
        Arc::new(ScriptedExchange::default().with("RELIANCE", Script::Series(compounding(0.01))));
    let extraction = r#"{"matches": [{"description": "Reliance"}]}"#;

    let outcome = pipeline(provider(extraction, 2), exchange)
        .analyze_at("How has Reliance been doing?", today())
        .await
        .unwrap();

    assert_eq!(outcome.report().expect("ranked outcome").period.months, 3);
}

#[tokio::test]
async fn nothing_matched_is_no_data() {
    let exchange = Arc::new(ScriptedExchange::default());
    let extraction = r#"{"matches": [{"description": "Tata Motors"}]}"#;

    // the summary is never requested
    let outcome = pipeline(provider(extraction, 1), Arc::clone(&exchange))
        .analyze_at("Tata Motors", today())
        .await
        .unwrap();

    match outcome {
        AnalysisOutcome::NoData {
            reason, unmatched, ..
        } => {
            assert_eq!(reason, NO_SYMBOLS);
            assert_eq!(unmatched, vec!["Tata Motors"]);
        }
        AnalysisOutcome::Ranked(_) => panic!("expected no data"),
    }
    assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nothing_fetched_is_no_data() {
    let exchange = Arc::new(ScriptedExchange::default().with("ONGC", Script::AlwaysFailing));
    let extraction = r#"{"matches": [{"description": "Oil & Natural Gas"}]}"#;

    let outcome = pipeline(provider(extraction, 1), exchange)
        .analyze_at("ONGC", today())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        AnalysisOutcome::NoData { ref reason, .. } if reason == NO_DATA
    ));
}

#[tokio::test]
async fn malformed_extraction_is_fatal() {
    let exchange = Arc::new(ScriptedExchange::default());
    let extraction = "Sure! The companies are Reliance and ONGC.";

    let err = pipeline(provider(extraction, 1), exchange)
        .analyze_at("Reliance and ONGC", today())
        .await
        .unwrap_err();

    assert!(matches!(err, StockError::Extraction(_)));
}

#[tokio::test]
async fn directory_loads_from_listing() {
    let exchange = ScriptedExchange::default();
    let directory = SymbolDirectory::load(&exchange).await.unwrap();

    assert_eq!(directory.len(), 5);
    assert_eq!(directory.names()[0], "Reliance Industries Limited");
    assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 1);
}
