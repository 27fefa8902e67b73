//! NSE stock ranking pipeline
//!
//! Turns a free-text question such as "rank Reliance, ONGC and Oil India over
//! the last 4 months" into a ranked performance report:
//!
//! - Symbol directory loaded from an NSE index listing
//! - Company extraction through a hosted language model
//! - Case-insensitive substring matching of descriptions to symbols
//! - Daily history from the NSE API, with session refresh, retry and pacing
//! - Weekly return, volatility and price-range metrics
//! - Ranking by average weekly return and a fixed-width report
//! - A narrative summary of the table from the language model
//!
//! # Example
//!
//! ```rust,ignore
//! use ranker_core::{MarketConfig, NseClient, RankerConfig, RankingPipeline, SymbolDirectory};
//! use ranker_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RankerConfig::builder().with_env().build()?;
//!     let provider = Arc::new(OpenAIProvider::from_env()?);
//!     let source = Arc::new(NseClient::new(config.market.clone())?);
//!     let directory = Arc::new(SymbolDirectory::load(source.as_ref()).await?);
//!
//!     let pipeline = RankingPipeline::new(provider, source, directory, &config);
//!     let outcome = pipeline.analyze("Reliance and ONGC over the last 6 months").await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod market;
pub mod matcher;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod query;
pub mod report;
pub mod retry;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use config::{LlmSettings, MarketConfig, RankerConfig};
pub use directory::SymbolDirectory;
pub use error::{Result, StockError};
pub use extractor::{EntityExtractor, ExtractionResponse};
pub use market::{ListingEntry, MarketDataFetcher, MarketDataSource, NseClient, PricePoint};
pub use matcher::MatchedCompany;
pub use metrics::Metrics;
pub use pipeline::{AnalysisOutcome, AnalysisReport, RankingPipeline};
pub use query::AnalysisPeriod;
pub use report::{RankedCompany, Rankings};
pub use retry::RetryPolicy;
pub use summarizer::NarrativeSummarizer;
