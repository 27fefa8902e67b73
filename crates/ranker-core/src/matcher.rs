//! Resolve extracted company descriptions to trading symbols

use crate::directory::SymbolDirectory;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// An extracted description and the symbol it resolved to, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedCompany {
    pub description: String,
    pub symbol: Option<String>,
}

/// First symbol whose company name contains `description`, case-insensitively
///
/// The description must be a substring of the name, not the reverse. A blank
/// description matches nothing, although every name trivially contains it.
pub fn match_company<'a>(directory: &'a SymbolDirectory, description: &str) -> Option<&'a str> {
    let needle = description.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    directory
        .iter()
        .find(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(symbol, _)| symbol)
}

/// Match every description, keeping extraction order
///
/// Identical descriptions are matched once.
pub fn match_all(directory: &SymbolDirectory, descriptions: &[String]) -> Vec<MatchedCompany> {
    let mut matched: Vec<MatchedCompany> = Vec::with_capacity(descriptions.len());

    for description in descriptions {
        if matched.iter().any(|m| &m.description == description) {
            continue;
        }

        let symbol = match_company(directory, description).map(str::to_string);
        match &symbol {
            Some(symbol) => info!("Matched '{}' to symbol: {}", description, symbol),
            None => warn!("Could not match '{}' to any NSE symbol", description),
        }

        matched.push(MatchedCompany {
            description: description.clone(),
            symbol,
        });
    }

    matched
}
