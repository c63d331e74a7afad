//! Daily forecast aggregation
//!
//! Reduces an hourly series for one location into a `DailyForecast`. The two
//! input sequences have different empty-input policies: an empty temperature
//! series has no defined range and is an error, while an empty precipitation
//! series means zero risk.

use chrono::{DateTime, Utc};

use crate::data::{map_code, DailyForecast, HourlySeries};
use crate::error::{AdvisoryError, Result};

/// Aggregate hourly samples into a daily summary stamped with the current time
///
/// # Arguments
/// * `temperatures` - Hourly temperatures in Celsius
/// * `precipitation_probabilities` - Hourly precipitation probabilities (0-100)
/// * `headline_code` - Weather code at fetch time, used as the day's label
/// * `location` - Display name attached to the summary
pub fn aggregate(
    temperatures: &[f64],
    precipitation_probabilities: &[f64],
    headline_code: i64,
    location: &str,
) -> Result<DailyForecast> {
    aggregate_at(
        temperatures,
        precipitation_probabilities,
        headline_code,
        location,
        Utc::now(),
    )
}

/// Same as [`aggregate`] with an explicit timestamp
pub fn aggregate_at(
    temperatures: &[f64],
    precipitation_probabilities: &[f64],
    headline_code: i64,
    location: &str,
    at: DateTime<Utc>,
) -> Result<DailyForecast> {
    let (min_temp, max_temp) = temperature_range(temperatures).ok_or_else(|| {
        AdvisoryError::InsufficientData(format!("no hourly temperatures for '{}'", location))
    })?;

    let precipitation_chance = precipitation_probabilities
        .iter()
        .fold(0.0_f64, |acc, &p| acc.max(p));

    Ok(DailyForecast {
        date: at,
        max_temp,
        min_temp,
        precipitation_chance,
        condition: map_code(headline_code).to_string(),
        location: location.to_string(),
    })
}

/// Aggregate a fetched series
pub fn aggregate_series(series: &HourlySeries) -> Result<DailyForecast> {
    aggregate(
        &series.temperatures,
        &series.precipitation_probabilities,
        series.headline_code,
        &series.location,
    )
}

/// Returns (min, max), or `None` for an empty series
fn temperature_range(temperatures: &[f64]) -> Option<(f64, f64)> {
    let (first, rest) = temperatures.split_first()?;
    Some(rest.iter().fold((*first, *first), |(min, max), &t| (min.min(t), max.max(t))))
}
