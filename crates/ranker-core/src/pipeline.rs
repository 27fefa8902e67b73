//! Query-to-report orchestration

use crate::config::RankerConfig;
use crate::directory::SymbolDirectory;
use crate::error::Result;
use crate::extractor::EntityExtractor;
use crate::market::{MarketDataFetcher, MarketDataSource};
use crate::matcher::match_all;
use crate::metrics::Metrics;
use crate::query::{AnalysisPeriod, lookback_or};
use crate::report::{RankedCompany, Rankings};
use crate::summarizer::NarrativeSummarizer;
use chrono::{Local, NaiveDate};
use ranker_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const NO_SYMBOLS: &str = "No valid symbols found to analyze";
pub const NO_DATA: &str = "No data available for analysis";

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// At least one company was ranked
    Ranked(AnalysisReport),

    /// Nothing matched, or nothing that matched had data
    NoData {
        query: String,
        reason: String,
        unmatched: Vec<String>,
    },
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Ranked(report) => Some(report),
            Self::NoData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub query: String,
    pub period: AnalysisPeriod,
    /// Descriptions that matched no listed company
    pub unmatched: Vec<String>,
    /// Symbols dropped because no usable history came back
    pub skipped: Vec<String>,
    pub rankings: Rankings,
    /// Rendered performance table
    pub table: String,
    /// Model commentary on the table
    pub summary: String,
}

/// Runs a query through extraction, matching, fetching, ranking and summary
///
/// Symbols are processed one at a time; the market source carries session
/// state, so give each concurrent caller its own pipeline or source.
pub struct RankingPipeline {
    extractor: EntityExtractor,
    summarizer: NarrativeSummarizer,
    fetcher: MarketDataFetcher,
    directory: Arc<SymbolDirectory>,
    default_lookback_months: u32,
}

impl RankingPipeline {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        source: Arc<dyn MarketDataSource>,
        directory: Arc<SymbolDirectory>,
        config: &RankerConfig,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(Arc::clone(&provider), config.llm.clone()),
            summarizer: NarrativeSummarizer::new(provider, config.llm.clone()),
            fetcher: MarketDataFetcher::new(source, &config.market),
            directory,
            default_lookback_months: config.default_lookback_months,
        }
    }

    /// Analyze `query` with the window ending today
    pub async fn analyze(&self, query: &str) -> Result<AnalysisOutcome> {
        self.analyze_at(query, Local::now().date_naive()).await
    }

    /// Analyze `query` with the window ending on `today`
    ///
    /// Fails only when the model calls fail or the extraction reply is
    /// malformed; companies that cannot be matched or fetched are dropped.
    #[instrument(skip(self))]
    pub async fn analyze_at(&self, query: &str, today: NaiveDate) -> Result<AnalysisOutcome> {
        info!("Analyzing query: {}", query);

        let months = lookback_or(query, self.default_lookback_months);
        let period = AnalysisPeriod::ending(today, months);
        info!("Analysis Period: {}", period);

        let descriptions = self.extractor.extract(query, &self.directory).await?;

        let matched = match_all(&self.directory, &descriptions);
        let unmatched: Vec<String> = matched
            .iter()
            .filter(|m| m.symbol.is_none())
            .map(|m| m.description.clone())
            .collect();
        if !unmatched.is_empty() {
            warn!("Could not match: {}", unmatched.join(", "));
        }

        let targets: Vec<(String, String)> = matched
            .into_iter()
            .filter_map(|m| m.symbol.map(|symbol| (m.description, symbol)))
            .collect();
        if targets.is_empty() {
            info!("{}", NO_SYMBOLS);
            return Ok(AnalysisOutcome::NoData {
                query: query.to_string(),
                reason: NO_SYMBOLS.to_string(),
                unmatched,
            });
        }

        let mut ranked = Vec::with_capacity(targets.len());
        let mut skipped = Vec::new();
        for (company, symbol) in targets {
            info!("Processing {} ({})", company, symbol);

            let metrics = match self.fetcher.fetch(&symbol, &period).await {
                Some(points) => Metrics::compute(&symbol, &points),
                None => {
                    skipped.push(symbol);
                    continue;
                }
            };

            match metrics {
                Ok(metrics) => ranked.push(RankedCompany {
                    company,
                    symbol,
                    metrics,
                }),
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    skipped.push(symbol);
                }
            }
        }

        if ranked.is_empty() {
            info!("{}", NO_DATA);
            return Ok(AnalysisOutcome::NoData {
                query: query.to_string(),
                reason: NO_DATA.to_string(),
                unmatched,
            });
        }

        let rankings = Rankings::rank(ranked);
        let table = rankings.render();
        info!("\n{}", table);

        let summary = self.summarizer.summarize(&table).await?;

        Ok(AnalysisOutcome::Ranked(AnalysisReport {
            query: query.to_string(),
            period,
            unmatched,
            skipped,
            rankings,
            table,
            summary,
        }))
    }
}
