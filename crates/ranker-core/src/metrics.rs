//! Weekly return and volatility metrics over a daily close series

use crate::error::{Result, StockError};
use crate::market::PricePoint;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Weeks per year used to annualize weekly volatility
const WEEKS_PER_YEAR: f64 = 52.0;

/// Performance figures for one symbol
///
/// All returns and the volatility are percentages; prices are in the quote
/// currency (INR). `avg_weekly_return` needs at least two weekly closes and
/// `volatility` at least three, otherwise they are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub avg_weekly_return: Option<f64>,
    pub total_return: f64,
    pub volatility: Option<f64>,
    pub current_price: f64,
    pub start_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
}

impl Metrics {
    /// Compute metrics for `symbol` from its daily closes
    ///
    /// The series is sorted by date first, so upstream order does not matter.
    pub fn compute(symbol: &str, points: &[PricePoint]) -> Result<Self> {
        let mut series = points.to_vec();
        series.sort_by_key(|p| p.date);

        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "empty price series".to_string(),
            });
        };

        let weekly = weekly_returns(&weekly_closes(&series));

        let (highest_price, lowest_price) = series.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(hi, lo), p| (hi.max(p.close), lo.min(p.close)),
        );

        Ok(Self {
            // a zero close makes the weekly figures undefined
            avg_weekly_return: mean(&weekly)
                .map(|m| m * 100.0)
                .filter(|v| v.is_finite()),
            total_return: (last.close / first.close - 1.0) * 100.0,
            volatility: sample_std(&weekly)
                .map(|s| s * 100.0 * WEEKS_PER_YEAR.sqrt())
                .filter(|v| v.is_finite()),
            current_price: last.close,
            start_price: first.close,
            highest_price,
            lowest_price,
        })
    }
}

/// Sunday closing the Monday-to-Sunday week that contains `date`
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_left = 6 - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(days_left)
}

/// Last close of each calendar week, labelled by the week-ending Sunday
///
/// `series` must be sorted by date. A week without rows (an exchange closure)
/// repeats the previous week's close, so it counts as a flat week.
pub fn weekly_closes(series: &[PricePoint]) -> Vec<PricePoint> {
    let mut weeks: Vec<PricePoint> = Vec::new();

    for point in series {
        let week = week_ending(point.date);
        if let Some(current) = weeks.last_mut() {
            if current.date == week {
                current.close = point.close;
                continue;
            }
            let carried = *current;
            let mut gap = carried.date + Duration::days(7);
            while gap < week {
                weeks.push(PricePoint::new(gap, carried.close));
                gap += Duration::days(7);
            }
        }
        weeks.push(PricePoint::new(week, point.close));
    }

    weeks
}

/// Fractional change between consecutive closes
pub fn weekly_returns(weekly: &[PricePoint]) -> Vec<f64> {
    weekly
        .windows(2)
        .map(|pair| pair[1].close / pair[0].close - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
