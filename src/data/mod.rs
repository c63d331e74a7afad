//! Core data models for tenki
//!
//! Every value here is produced whole by one pipeline stage and consumed
//! read-only by the next. Field names serialize in camelCase because the
//! agent tool schemas use that convention.

pub mod conditions;
pub mod geocoding;
pub mod weather;

pub use conditions::{map_code, UNKNOWN_CONDITION};
pub use geocoding::{CityGeocoder, GeocodedCity, LocationResolver};
pub use weather::WeatherClient;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdvisoryError, Result};

/// A validated WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair, rejecting values outside the WGS84 ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AdvisoryError::InvalidInput(format!(
                "latitude {} is outside -90..90",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AdvisoryError::InvalidInput(format!(
                "longitude {} is outside -180..180",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Administrative specificity of a resolved address
///
/// 1: prefecture, 2: municipality, 3: town, 4: chome, 5: block,
/// 6: lot, 7: sub-lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AddressLevel(u8);

impl AddressLevel {
    /// Prefecture or region, the coarsest level
    pub const PREFECTURE: AddressLevel = AddressLevel(1);
    /// City, ward, town or village
    pub const MUNICIPALITY: AddressLevel = AddressLevel(2);
    /// Sub-lot, the finest level
    pub const SUB_LOT: AddressLevel = AddressLevel(7);

    /// Creates a level, returning `None` outside 1..=7
    pub fn new(level: u8) -> Option<Self> {
        (Self::PREFECTURE.0..=Self::SUB_LOT.0)
            .contains(&level)
            .then_some(Self(level))
    }

    /// Numeric level
    pub fn value(self) -> u8 {
        self.0
    }

    /// True when the level is too coarse to fetch useful weather for
    pub fn is_coarse(self) -> bool {
        self.0 <= Self::PREFECTURE.0
    }
}

impl Default for AddressLevel {
    fn default() -> Self {
        Self::PREFECTURE
    }
}

impl TryFrom<u8> for AddressLevel {
    type Error = String;

    fn try_from(level: u8) -> std::result::Result<Self, Self::Error> {
        Self::new(level).ok_or_else(|| format!("address level {} is outside 1..=7", level))
    }
}

impl From<AddressLevel> for u8 {
    fn from(level: AddressLevel) -> Self {
        level.0
    }
}

impl fmt::Display for AddressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A place name resolved to coordinates and an administrative level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    /// 緯度 (latitude)
    pub latitude: f64,
    /// 経度 (longitude)
    pub longitude: f64,
    /// 住所テキスト (provider display name)
    pub address: String,
    /// 住所レベル (1: prefecture ... 7: sub-lot)
    pub address_level: AddressLevel,
}

impl ResolvedLocation {
    /// Coordinates of the resolved location
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Current weather conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// 気温 in Celsius
    pub temperature: f64,
    /// 体感温度 in Celsius
    pub feels_like: f64,
    /// 湿度 in percent
    pub humidity: f64,
    /// 風速 in m/s
    pub wind_speed: f64,
    /// 最大瞬間風速 in m/s
    pub wind_gust: f64,
    /// 天気の状態, always non-empty
    pub conditions: String,
    /// 地点名
    pub location: String,
}

/// Daily summary derived from an hourly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// When the summary was produced
    pub date: DateTime<Utc>,
    /// Highest hourly temperature in Celsius
    pub max_temp: f64,
    /// Lowest hourly temperature in Celsius
    pub min_temp: f64,
    /// Highest hourly precipitation probability (0-100)
    pub precipitation_chance: f64,
    /// Headline condition label
    pub condition: String,
    /// Display name of the location
    pub location: String,
}

/// Hourly forecast samples for a single location, before aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    /// Display name of the location
    pub location: String,
    /// Hourly temperatures in Celsius
    pub temperatures: Vec<f64>,
    /// Hourly precipitation probabilities (0-100)
    pub precipitation_probabilities: Vec<f64>,
    /// Weather code current at fetch time
    pub headline_code: i64,
}

/// Sends a request and returns the body of a successful response
///
/// Non-2xx statuses are reported as upstream errors; transport failures and
/// timeouts surface as `RequestFailed`.
pub(crate) async fn fetch_body(request: reqwest::RequestBuilder, provider: &str) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdvisoryError::Upstream(format!("{} returned HTTP {}", provider, status)));
    }
    Ok(response.text().await?)
}

/// Validates coordinates reported by a provider
///
/// Out-of-range values surface as `Upstream`, not `InvalidInput`.
pub(crate) fn provider_coordinates(
    latitude: f64,
    longitude: f64,
    provider: &str,
) -> Result<Coordinates> {
    Coordinates::new(latitude, longitude).map_err(|e| match e {
        AdvisoryError::InvalidInput(msg) => {
            AdvisoryError::Upstream(format!("{} returned bad coordinates: {}", provider, msg))
        }
        other => other,
    })
}

/// Parses a JSON body, reporting malformed payloads as upstream errors
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(body: &str, provider: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        AdvisoryError::Upstream(format!("malformed {} response: {}", provider, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_coordinates_out_of_range_is_upstream() {
        match provider_coordinates(135.0, 400.0, "test provider") {
            Err(AdvisoryError::Upstream(msg)) => {
                assert!(msg.contains("test provider"));
                assert!(msg.contains("latitude"));
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
        assert!(provider_coordinates(35.0, 139.0, "test provider").is_ok());
    }

    #[test]
    fn test_coordinates_accept_valid_range() {
        let coords = Coordinates::new(35.6662, 139.3160).unwrap();
        assert!((coords.latitude - 35.6662).abs() < 0.0001);
        assert!((coords.longitude - 139.3160).abs() < 0.0001);

        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_coordinates_reject_out_of_range() {
        assert!(matches!(
            Coordinates::new(91.0, 0.0),
            Err(AdvisoryError::InvalidInput(_))
        ));
        assert!(matches!(
            Coordinates::new(0.0, -180.5),
            Err(AdvisoryError::InvalidInput(_))
        ));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_address_level_gate() {
        assert!(AddressLevel::PREFECTURE.is_coarse());
        assert!(!AddressLevel::MUNICIPALITY.is_coarse());
        assert!(!AddressLevel::new(7).unwrap().is_coarse());
        assert!(AddressLevel::new(0).is_none());
        assert!(AddressLevel::new(8).is_none());
        assert_eq!(AddressLevel::new(7), Some(AddressLevel::SUB_LOT));
        assert_eq!(AddressLevel::default(), AddressLevel::PREFECTURE);
    }

    #[test]
    fn test_address_level_deserialization_rejects_out_of_range() {
        let level: AddressLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level.value(), 3);
        assert!(serde_json::from_str::<AddressLevel>("0").is_err());
        assert!(serde_json::from_str::<AddressLevel>("8").is_err());
    }

    #[test]
    fn test_resolved_location_serializes_tool_schema_names() {
        let location = ResolvedLocation {
            latitude: 35.6662,
            longitude: 139.316,
            address: "東京都八王子市".to_string(),
            address_level: AddressLevel::MUNICIPALITY,
        };

        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["address"], "東京都八王子市");
        assert_eq!(json["addressLevel"], 2);
        assert!(json.get("address_level").is_none());
    }

    #[test]
    fn test_weather_reading_serializes_camel_case() {
        let reading = WeatherReading {
            temperature: 18.2,
            feels_like: 17.0,
            humidity: 60.0,
            wind_speed: 3.4,
            wind_gust: 7.9,
            conditions: "曇り".to_string(),
            location: "八王子市".to_string(),
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["feelsLike"], 17.0);
        assert_eq!(json["windGust"], 7.9);
        assert_eq!(json["conditions"], "曇り");
    }

    #[test]
    fn test_daily_forecast_date_is_iso8601() {
        let forecast = DailyForecast {
            date: "2024-07-15T05:30:00Z".parse().unwrap(),
            max_temp: 20.0,
            min_temp: 8.0,
            precipitation_chance: 30.0,
            condition: "快晴".to_string(),
            location: "Tokyo".to_string(),
        };

        let json = serde_json::to_value(&forecast).unwrap();
        assert_eq!(json["date"], "2024-07-15T05:30:00Z");
        assert_eq!(json["precipitationChance"], 30.0);
    }
}
