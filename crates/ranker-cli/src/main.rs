//! Command-line and HTTP front end for the NSE stock ranker
//!
//! # Usage
//!
//! ```bash
//! export GROQ_API_KEY=...
//!
//! # One-shot report
//! stock-ranker analyze "Rank Reliance, ONGC and Oil India over the last 4 months"
//!
//! # HTTP endpoint
//! stock-ranker serve --addr 0.0.0.0:8080
//! curl -X POST localhost:8080 -d '{"query": "Reliance vs ONGC"}'
//! ```

mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ranker_core::{
    AnalysisOutcome, MarketDataSource, NseClient, RankerConfig, RankingPipeline, SymbolDirectory,
};
use ranker_llm::LLMProvider;
use ranker_llm::providers::OpenAIProvider;
use ranker_utils::{Config, init_tracing};
use server::{AppState, SourceFactory};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-ranker", version)]
#[command(about = "Rank NSE stocks named in a free-text query", long_about = None)]
struct Args {
    /// Model used for extraction and summary (overrides LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Lookback in months when the query names none (overrides RANKER_LOOKBACK_MONTHS)
    #[arg(long, global = true)]
    lookback: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one query and print the report
    Analyze {
        /// Free-text question naming the companies to compare
        query: String,

        /// Print the full outcome as JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP trigger
    Serve {
        /// Address to listen on
        #[arg(long, env = "RANKER_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::from_env();
    init_tracing(settings.log_format);

    let args = Args::parse();
    info!("Starting {} ({})", settings.app_name, settings.environment);

    let config = ranker_config(&args)?;
    let provider: Arc<dyn LLMProvider> =
        Arc::new(OpenAIProvider::from_env().context("language model is not configured")?);

    let listing_source = NseClient::new(config.market.clone())?;
    let directory = Arc::new(
        SymbolDirectory::load(&listing_source)
            .await
            .context("could not load the NSE symbol directory")?,
    );

    match args.command {
        Command::Analyze { query, json } => {
            let pipeline = RankingPipeline::new(
                provider,
                Arc::new(listing_source),
                directory,
                &config,
            );
            let outcome = pipeline.analyze(&query).await?;
            print_outcome(&outcome, json)?;
        }
        Command::Serve { addr } => {
            let market = config.market.clone();
            // one cookie session per request
            let sources: SourceFactory =
                Arc::new(move || -> ranker_core::Result<Arc<dyn MarketDataSource>> {
                    Ok(Arc::new(NseClient::new(market.clone())?))
                });

            let state = AppState {
                provider,
                directory,
                config: Arc::new(config),
                sources,
            };
            server::serve(addr, state).await?;
        }
    }

    Ok(())
}

fn ranker_config(args: &Args) -> anyhow::Result<RankerConfig> {
    let mut builder = RankerConfig::builder().with_env();
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(months) = args.lookback {
        builder = builder.default_lookback_months(months);
    }
    Ok(builder.build()?)
}

fn print_outcome(outcome: &AnalysisOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        AnalysisOutcome::Ranked(report) => {
            println!("Analysis Period: {}\n", report.period);
            if !report.unmatched.is_empty() {
                println!("Could not match: {}", report.unmatched.join(", "));
            }
            if !report.skipped.is_empty() {
                println!("No data for: {}", report.skipped.join(", "));
            }
            println!("{}", report.table);
            println!("{}", report.summary);
        }
        AnalysisOutcome::NoData {
            reason, unmatched, ..
        } => {
            println!("{reason}.");
            for company in unmatched {
                println!("- {company}");
            }
        }
    }
    Ok(())
}
