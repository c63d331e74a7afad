//! Open-Meteo weather API client
//!
//! This module fetches current conditions and hourly forecast series from the
//! Open-Meteo API and converts them into `WeatherReading` and `HourlySeries`.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AdvisoryError, Result};

use super::geocoding::CityGeocoder;
use super::{fetch_body, map_code, parse_json, Coordinates, HourlySeries, WeatherReading};

const WEATHER_PROVIDER: &str = "Open-Meteo forecast";

/// Fields requested for current conditions
const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,wind_gusts_10m,weather_code";

/// Fields requested for the hourly series
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability";

/// Client for fetching weather data from the Open-Meteo API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    geocoder: CityGeocoder,
    forecast_days: u8,
}

impl WeatherClient {
    /// Create a new WeatherClient from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(settings.http_client()?, settings))
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            geocoder: CityGeocoder::with_client(client.clone(), settings),
            client,
            base_url: settings.forecast_base_url.trim_end_matches('/').to_string(),
            forecast_days: settings.forecast_days.max(1),
        }
    }

    /// Fetch current conditions for known coordinates
    ///
    /// No geocoding happens here; `label` is attached to the reading as-is.
    ///
    /// # Returns
    /// * `Ok(WeatherReading)` - Current conditions at the coordinates
    /// * `Err(AdvisoryError::Upstream)` - If the response lacks a `current` block
    pub async fn fetch_current(&self, coords: Coordinates, label: &str) -> Result<WeatherReading> {
        debug!(%coords, label, "Fetching current weather");
        let request = self.client.get(self.forecast_url()).query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("wind_speed_unit", "ms".to_string()),
        ]);

        let body = fetch_body(request, WEATHER_PROVIDER).await?;
        let reading = parse_current_response(&body, label)?;

        info!(
            location = %reading.location,
            temperature = reading.temperature,
            conditions = %reading.conditions,
            "Retrieved current weather"
        );
        Ok(reading)
    }

    /// Geocode a city name, then fetch its current conditions
    ///
    /// The reading is labelled with the geocoder's display name.
    pub async fn fetch_current_by_name(&self, location: &str) -> Result<WeatherReading> {
        let city = self.geocoder.lookup(location).await?;
        let coords = Coordinates::new(city.latitude, city.longitude)?;
        self.fetch_current(coords, &city.name).await
    }

    /// Geocode a city name, then fetch its hourly forecast series
    ///
    /// The geocoding and forecast requests run back to back; no address level
    /// check applies here.
    pub async fn fetch_forecast_series(&self, city: &str) -> Result<HourlySeries> {
        let found = self.geocoder.lookup(city).await?;
        let coords = Coordinates::new(found.latitude, found.longitude)?;

        debug!(%coords, city = %found.name, days = self.forecast_days, "Fetching hourly forecast");
        let request = self.client.get(self.forecast_url()).query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("current", "weather_code".to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", self.forecast_days.to_string()),
        ]);

        let body = fetch_body(request, WEATHER_PROVIDER).await?;
        let series = parse_series_response(&body, &found.name)?;

        info!(
            location = %series.location,
            hours = series.temperatures.len(),
            "Retrieved hourly forecast"
        );
        Ok(series)
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

/// Parse a current-conditions body into a WeatherReading
fn parse_current_response(body: &str, label: &str) -> Result<WeatherReading> {
    let response: CurrentResponse = parse_json(body, WEATHER_PROVIDER)?;
    let current = response.current.ok_or_else(|| {
        AdvisoryError::Upstream("weather response is missing the current block".to_string())
    })?;

    Ok(WeatherReading {
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        humidity: current.relative_humidity_2m,
        wind_speed: current.wind_speed_10m,
        wind_gust: current.wind_gusts_10m,
        conditions: map_code(current.weather_code).to_string(),
        location: label.to_string(),
    })
}

/// Parse an hourly forecast body into an HourlySeries
///
/// Null samples (hours the model has no value for) are skipped.
fn parse_series_response(body: &str, label: &str) -> Result<HourlySeries> {
    let response: SeriesResponse = parse_json(body, WEATHER_PROVIDER)?;
    let current = response.current.ok_or_else(|| {
        AdvisoryError::Upstream("weather response is missing the current block".to_string())
    })?;
    let hourly = response.hourly.ok_or_else(|| {
        AdvisoryError::Upstream("weather response is missing the hourly block".to_string())
    })?;

    let temperatures: Vec<f64> = hourly.temperature_2m.into_iter().flatten().collect();
    let precipitation_probabilities: Vec<f64> = hourly
        .precipitation_probability
        .into_iter()
        .flatten()
        .collect();

    if temperatures.len() != precipitation_probabilities.len() {
        warn!(
            temperatures = temperatures.len(),
            precipitation = precipitation_probabilities.len(),
            "Hourly series lengths differ"
        );
    }

    Ok(HourlySeries {
        location: label.to_string(),
        temperatures,
        precipitation_probabilities,
        headline_code: current.weather_code,
    })
}

/// Open-Meteo response carrying current conditions
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentWeather>,
}

/// Current weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    wind_gusts_10m: f64,
    weather_code: i64,
}

/// Open-Meteo response carrying the headline code and hourly series
#[derive(Debug, Deserialize)]
struct SeriesResponse {
    current: Option<CurrentCode>,
    hourly: Option<HourlyWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentCode {
    weather_code: i64,
}

/// Hourly weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct HourlyWeather {
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}
