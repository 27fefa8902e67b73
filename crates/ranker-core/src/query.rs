//! Query parsing: lookback period and the analysis window it implies

use chrono::{Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static LOOKBACK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)last\s+(\d+)\s+months?").expect("valid lookback pattern"));

/// Date format the exchange history endpoint expects
const NSE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Extract `N` from a phrase like "last N months"
///
/// Matching ignores case, so "Last 6 Months" counts. Returns `None` when the
/// query names no period or names zero months; a zero-month window would
/// fetch nothing, so callers fall back to their default instead.
pub fn parse_lookback_months(query: &str) -> Option<u32> {
    LOOKBACK_PATTERN
        .captures(query)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|months| *months > 0)
}

/// Lookback from the query, or `default` when absent
pub fn lookback_or(query: &str, default: u32) -> u32 {
    parse_lookback_months(query).unwrap_or(default)
}

/// Inclusive date window covered by one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub months: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisPeriod {
    /// Window of `months` calendar months ending on `end`
    ///
    /// A start day past the end of the target month is clamped to its last
    /// day (31 March minus one month is 29 February in a leap year).
    pub fn ending(end: NaiveDate, months: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { months, start, end }
    }

    /// `from` parameter for the history endpoint
    pub fn nse_from(&self) -> String {
        self.start.format(NSE_DATE_FORMAT).to_string()
    }

    /// `to` parameter for the history endpoint
    pub fn nse_to(&self) -> String {
        self.end.format(NSE_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for AnalysisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
