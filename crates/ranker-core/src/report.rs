//! Ranking and fixed-width report rendering

use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const RULE_WIDTH: usize = 120;

/// A company that made it through matching and fetching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompany {
    /// Description as extracted from the query
    pub company: String,
    pub symbol: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Companies ordered by average weekly return, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rankings(Vec<RankedCompany>);

impl Rankings {
    /// Sort `companies` by `avg_weekly_return`, descending
    ///
    /// Companies without a finite average sort after every defined value;
    /// equal values keep their input order.
    pub fn rank(mut companies: Vec<RankedCompany>) -> Self {
        let key = |c: &RankedCompany| c.metrics.avg_weekly_return.filter(|v| v.is_finite());
        companies.sort_by(|a, b| {
            match (key(a), key(b)) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        Self(companies)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedCompany> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbols in rank order
    pub fn symbols(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.symbol.as_str()).collect()
    }

    /// Render the plain-text performance table
    pub fn render(&self) -> String {
        let mut out = String::from("Stock Performance Rankings:\n");
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
        out.push_str(&format!(
            "{:<15} {:<10} {:>12} {:>10} {:>10} {:>12} {:>25}\n",
            "Company", "Symbol", "Avg Weekly", "Total", "Volatility", "Current", "Range"
        ));
        out.push_str(&format!(
            "{:<15} {:<10} {:>12} {:>10} {:>10} {:>12} {:>25}\n",
            "", "", "Return %", "Return %", "%", "Price INR", "(Low-High) INR"
        ));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        for entry in &self.0 {
            let m = &entry.metrics;
            let range = format!(
                "INR {} - INR{}",
                group_thousands(m.lowest_price),
                group_thousands(m.highest_price)
            );
            out.push_str(&format!(
                "{:<15} {:<10} {:>12} {:>10.2} {:>10} {:>12.2} {:>25}\n",
                entry.company,
                entry.symbol,
                optional(m.avg_weekly_return),
                m.total_return,
                optional(m.volatility),
                m.current_price,
                range
            ));
        }

        out
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Two decimals with comma-grouped thousands: 1234567.891 -> "1,234,567.89"
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
