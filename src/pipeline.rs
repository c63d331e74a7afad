//! Advisory pipeline
//!
//! Composes resolution, weather retrieval, aggregation and planning in two
//! shapes:
//! - conversational: resolve a free-text place, stop with a clarification
//!   request when the match is only prefecture-level, otherwise fetch current
//!   weather for the resolved coordinates;
//! - scheduled: fetch an hourly series for a well-known city, aggregate it,
//!   and hand the summary to an [`ActivityPlanner`].
//!
//! Every failure aborts the pipeline and reaches the caller unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::activities::ActivityPlanner;
use crate::data::{
    AddressLevel, Coordinates, DailyForecast, HourlySeries, LocationResolver, ResolvedLocation,
    WeatherClient, WeatherReading,
};
use crate::error::Result;
use crate::forecast::aggregate_series;

/// Resolves free-text place names
#[async_trait]
pub trait LocationLookup: Send + Sync {
    /// Resolve a place name into coordinates and an address level
    async fn resolve(&self, place_name: &str) -> Result<ResolvedLocation>;
}

/// Retrieves weather from a provider
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions at known coordinates, labelled with `label`
    async fn fetch_current(&self, coords: Coordinates, label: &str) -> Result<WeatherReading>;

    /// Current conditions for a city name (geocodes first)
    async fn fetch_current_by_name(&self, location: &str) -> Result<WeatherReading>;

    /// Hourly forecast series for a city name (geocodes first)
    async fn fetch_forecast_series(&self, city: &str) -> Result<HourlySeries>;
}

#[async_trait]
impl LocationLookup for LocationResolver {
    async fn resolve(&self, place_name: &str) -> Result<ResolvedLocation> {
        LocationResolver::resolve(self, place_name).await
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_current(&self, coords: Coordinates, label: &str) -> Result<WeatherReading> {
        WeatherClient::fetch_current(self, coords, label).await
    }

    async fn fetch_current_by_name(&self, location: &str) -> Result<WeatherReading> {
        WeatherClient::fetch_current_by_name(self, location).await
    }

    async fn fetch_forecast_series(&self, city: &str) -> Result<HourlySeries> {
        WeatherClient::fetch_forecast_series(self, city).await
    }
}

/// Request for a more specific place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationRequest {
    /// The location the resolver matched
    pub resolved: ResolvedLocation,
    /// Message to relay to the user
    pub message: String,
}

impl ClarificationRequest {
    fn for_location(place_name: &str, resolved: ResolvedLocation) -> Self {
        let message = format!(
            "「{}」は「{}」(住所レベル{})として認識されました。都道府県単位では天気を正確に取得できないため、市区町村以下の地点名を指定してください。",
            place_name, resolved.address, resolved.address_level
        );
        Self { resolved, message }
    }
}

/// Outcome of the conversational pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advisory {
    /// The place was too coarse; ask for a more specific one
    Clarification(ClarificationRequest),
    /// Current weather at the resolved location
    Weather {
        location: ResolvedLocation,
        reading: WeatherReading,
    },
}

/// Orchestrates the advisory stages over pluggable providers
pub struct AdvisoryPipeline<L, W, P> {
    resolver: L,
    weather: W,
    planner: P,
}

impl<L, W, P> AdvisoryPipeline<L, W, P>
where
    L: LocationLookup,
    W: WeatherSource,
    P: ActivityPlanner,
{
    /// Create a pipeline from its three collaborators
    pub fn new(resolver: L, weather: W, planner: P) -> Self {
        Self {
            resolver,
            weather,
            planner,
        }
    }

    /// Resolve a place name without fetching weather
    pub async fn resolve_location(&self, place_name: &str) -> Result<ResolvedLocation> {
        self.resolver.resolve(place_name).await
    }

    /// Current weather for a city name
    pub async fn weather_by_location(&self, location: &str) -> Result<WeatherReading> {
        self.weather.fetch_current_by_name(location).await
    }

    /// Current weather at explicit coordinates
    pub async fn weather_by_coordinates(
        &self,
        coords: Coordinates,
        label: &str,
    ) -> Result<WeatherReading> {
        self.weather.fetch_current(coords, label).await
    }

    /// Conversational mode: resolve, gate on address level, then fetch
    ///
    /// Prefecture-level matches never reach the weather provider.
    #[instrument(skip(self))]
    pub async fn advise(&self, place_name: &str) -> Result<Advisory> {
        let resolved = self.resolver.resolve(place_name).await?;

        if resolved.address_level.is_coarse() {
            info!(
                address = %resolved.address,
                level = %resolved.address_level,
                required = %AddressLevel::MUNICIPALITY,
                "Location too coarse, asking for clarification"
            );
            let request = ClarificationRequest::for_location(place_name, resolved);
            return Ok(Advisory::Clarification(request));
        }

        let coords = Coordinates::new(resolved.latitude, resolved.longitude)?;
        let reading = self.weather.fetch_current(coords, &resolved.address).await?;
        Ok(Advisory::Weather {
            location: resolved,
            reading,
        })
    }

    /// Scheduled mode, first half: fetch the hourly series and aggregate it
    #[instrument(skip(self))]
    pub async fn fetch_and_aggregate(&self, city: &str) -> Result<DailyForecast> {
        let series = self.weather.fetch_forecast_series(city).await?;
        aggregate_series(&series)
    }

    /// Scheduled mode: aggregate, then return the planner's text verbatim
    #[instrument(skip(self))]
    pub async fn plan(&self, city: &str) -> Result<String> {
        let forecast = self.fetch_and_aggregate(city).await?;
        self.planner.generate(&forecast).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::AdvisoryError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver returning a fixed level for every name
    struct FixedResolver {
        level: u8,
    }

    #[async_trait]
    impl LocationLookup for FixedResolver {
        async fn resolve(&self, place_name: &str) -> Result<ResolvedLocation> {
            if place_name == "nowhere" {
                return Err(AdvisoryError::not_found(place_name));
            }
            Ok(ResolvedLocation {
                latitude: 35.6662,
                longitude: 139.316,
                address: format!("東京都{}", place_name),
                address_level: AddressLevel::new(self.level).unwrap(),
            })
        }
    }

    /// Weather source that counts calls
    #[derive(Default)]
    struct CountingWeather {
        current_calls: AtomicUsize,
        series_calls: AtomicUsize,
        fail: bool,
        empty_series: bool,
    }

    #[async_trait]
    impl WeatherSource for CountingWeather {
        async fn fetch_current(&self, _coords: Coordinates, label: &str) -> Result<WeatherReading> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AdvisoryError::Upstream("missing current block".to_string()));
            }
            Ok(WeatherReading {
                temperature: 21.0,
                feels_like: 20.5,
                humidity: 55.0,
                wind_speed: 3.0,
                wind_gust: 6.0,
                conditions: "ほぼ晴れ".to_string(),
                location: label.to_string(),
            })
        }

        async fn fetch_current_by_name(&self, location: &str) -> Result<WeatherReading> {
            let coords = Coordinates::new(35.0, 139.0)?;
            self.fetch_current(coords, location).await
        }

        async fn fetch_forecast_series(&self, city: &str) -> Result<HourlySeries> {
            self.series_calls.fetch_add(1, Ordering::SeqCst);
            Ok(HourlySeries {
                location: city.to_string(),
                temperatures: if self.empty_series {
                    Vec::new()
                } else {
                    vec![10.0, 15.0, 8.0, 20.0]
                },
                precipitation_probabilities: vec![0.0, 30.0, 10.0, 5.0],
                headline_code: 1,
            })
        }
    }

    /// Planner echoing the forecast it received
    struct EchoPlanner;

    #[async_trait]
    impl ActivityPlanner for EchoPlanner {
        async fn generate(&self, forecast: &DailyForecast) -> Result<String> {
            Ok(format!(
                "{} {}-{} {}%",
                forecast.location,
                forecast.min_temp,
                forecast.max_temp,
                forecast.precipitation_chance
            ))
        }
    }

    fn pipeline(
        level: u8,
        weather: CountingWeather,
    ) -> AdvisoryPipeline<FixedResolver, CountingWeather, EchoPlanner> {
        AdvisoryPipeline::new(FixedResolver { level }, weather, EchoPlanner)
    }

    #[tokio::test]
    async fn test_prefecture_level_never_fetches_weather() {
        let p = pipeline(1, CountingWeather::default());

        let advisory = p.advise("東京都").await.unwrap();
        match advisory {
            Advisory::Clarification(request) => {
                assert_eq!(request.resolved.address_level, AddressLevel::PREFECTURE);
                assert!(request.message.contains("市区町村"));
            }
            other => panic!("Expected clarification, got {:?}", other),
        }
        assert_eq!(p.weather.current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_municipality_level_fetches_exactly_once() {
        for level in 2..=7 {
            let p = pipeline(level, CountingWeather::default());

            let advisory = p.advise("八王子市").await.unwrap();
            match advisory {
                Advisory::Weather { location, reading } => {
                    assert_eq!(location.address, "東京都八王子市");
                    assert_eq!(reading.location, "東京都八王子市");
                    assert!(!reading.conditions.is_empty());
                }
                other => panic!("Expected weather, got {:?}", other),
            }
            assert_eq!(p.weather.current_calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_resolution_failure_propagates_without_fetch() {
        let p = pipeline(2, CountingWeather::default());
        assert!(matches!(
            p.advise("nowhere").await,
            Err(AdvisoryError::NotFound { .. })
        ));
        assert_eq!(p.weather.current_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_weather_failure_propagates_unchanged() {
        let weather = CountingWeather {
            fail: true,
            ..Default::default()
        };
        let p = pipeline(3, weather);
        assert!(matches!(
            p.advise("八王子市").await,
            Err(AdvisoryError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_returns_planner_text_verbatim() {
        let p = pipeline(1, CountingWeather::default());
        let text = p.plan("Tokyo").await.unwrap();
        assert_eq!(text, "Tokyo 8-20 30%");
        assert_eq!(p.weather.series_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plan_with_empty_series_is_insufficient_data() {
        let weather = CountingWeather {
            empty_series: true,
            ..Default::default()
        };
        let p = pipeline(1, weather);
        assert!(matches!(
            p.plan("Tokyo").await,
            Err(AdvisoryError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_advisory_serializes_with_kind_tag() {
        let advisory = Advisory::Clarification(ClarificationRequest::for_location(
            "東京都",
            ResolvedLocation {
                latitude: 35.69,
                longitude: 139.69,
                address: "東京都".to_string(),
                address_level: AddressLevel::PREFECTURE,
            },
        ));
        let json = serde_json::to_value(&advisory).unwrap();
        assert_eq!(json["kind"], "clarification");
        assert_eq!(json["resolved"]["addressLevel"], 1);
    }
}
