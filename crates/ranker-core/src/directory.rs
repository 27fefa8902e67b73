//! Symbol directory: trading symbol to company display name

use crate::error::{Result, StockError};
use crate::market::{ListingEntry, MarketDataSource};
use serde::Serialize;
use tracing::{info, instrument};

/// Read-only symbol table, iterated in listing order
///
/// Order matters: the matcher takes the first company whose name contains
/// the description, so earlier entries win ties.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolDirectory {
    entries: Vec<(String, String)>,
}

impl SymbolDirectory {
    /// Build from `(symbol, company name)` pairs
    ///
    /// A repeated symbol keeps its first position and its latest name.
    pub fn from_entries<I, S, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<String>,
    {
        let mut directory = Self::default();
        for (symbol, name) in entries {
            directory.insert(symbol.into(), name.into());
        }
        directory
    }

    /// Load the configured index listing from `source`
    #[instrument(skip(source))]
    pub async fn load(source: &dyn MarketDataSource) -> Result<Self> {
        source.refresh_session().await?;
        let listing = source.listing().await?;
        if listing.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol: "listing".to_string(),
                reason: "index listing returned no constituents".to_string(),
            });
        }

        let directory = Self::from_entries(
            listing
                .into_iter()
                .map(|ListingEntry { symbol, company_name }| (symbol, company_name)),
        );
        info!("Loaded {} symbols", directory.len());
        Ok(directory)
    }

    fn insert(&mut self, symbol: String, name: String) {
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = name,
            None => self.entries.push((symbol, name)),
        }
    }

    /// Company display names in listing order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, name)| name.as_str()).collect()
    }

    /// `(symbol, name)` pairs in listing order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, n)| (s.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
