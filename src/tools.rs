//! Operations exposed to a conversational agent
//!
//! The agent decides which operation to call and in what order; this module
//! only defines the closed set of requests, validates them at the boundary,
//! and executes them against an [`AdvisoryPipeline`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activities::ActivityPlanner;
use crate::data::{Coordinates, ResolvedLocation, WeatherReading};
use crate::error::{AdvisoryError, Result};
use crate::pipeline::{AdvisoryPipeline, LocationLookup, WeatherSource};

/// Registration metadata for one agent tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    /// Stable tool id
    pub id: &'static str,
    /// Description shown to the model
    pub description: &'static str,
}

/// Tools available to the agent
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        id: "get-municipality",
        description: "曖昧な地点名から緯度・経度・住所情報を取得する",
    },
    ToolSpec {
        id: "get-weather",
        description: "指定された地点の現在の天気を取得する",
    },
    ToolSpec {
        id: "get-weather-by-coordinates",
        description: "緯度・経度と地点名から現在の天気を取得する",
    },
];

/// A request from the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "camelCase")]
pub enum ToolRequest {
    /// Resolve an ambiguous place name
    ResolveLocation {
        /// 曖昧な地点名（都市名、住所など）
        location: String,
    },
    /// Current weather for a city name
    GetWeatherByLocation {
        /// 都市名
        location: String,
    },
    /// Current weather at coordinates already resolved
    GetWeatherByCoordinates {
        /// 緯度
        latitude: f64,
        /// 経度
        longitude: f64,
        /// 地点名
        label: String,
    },
}

/// Result returned to the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    /// Output of `resolveLocation`
    Location(ResolvedLocation),
    /// Output of either weather request
    Weather(WeatherReading),
}

impl ToolRequest {
    /// Parse and validate a JSON request
    pub fn from_json(json: &str) -> Result<Self> {
        let request: ToolRequest = serde_json::from_str(json)
            .map_err(|e| AdvisoryError::InvalidInput(format!("invalid tool request: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    /// Check field constraints that the type system does not express
    pub fn validate(&self) -> Result<()> {
        match self {
            ToolRequest::ResolveLocation { location }
            | ToolRequest::GetWeatherByLocation { location } => {
                non_empty("location", location)?;
            }
            ToolRequest::GetWeatherByCoordinates {
                latitude,
                longitude,
                label,
            } => {
                Coordinates::new(*latitude, *longitude)?;
                non_empty("label", label)?;
            }
        }
        Ok(())
    }

    /// Tool id for this request
    pub fn tool_id(&self) -> &'static str {
        match self {
            ToolRequest::ResolveLocation { .. } => TOOLS[0].id,
            ToolRequest::GetWeatherByLocation { .. } => TOOLS[1].id,
            ToolRequest::GetWeatherByCoordinates { .. } => TOOLS[2].id,
        }
    }

    /// Validate and execute the request
    pub async fn dispatch<L, W, P>(
        &self,
        pipeline: &AdvisoryPipeline<L, W, P>,
    ) -> Result<ToolResponse>
    where
        L: LocationLookup,
        W: WeatherSource,
        P: ActivityPlanner,
    {
        self.validate()?;
        debug!(tool = self.tool_id(), "Dispatching tool request");

        match self {
            ToolRequest::ResolveLocation { location } => pipeline
                .resolve_location(location)
                .await
                .map(ToolResponse::Location),
            ToolRequest::GetWeatherByLocation { location } => pipeline
                .weather_by_location(location)
                .await
                .map(ToolResponse::Weather),
            ToolRequest::GetWeatherByCoordinates {
                latitude,
                longitude,
                label,
            } => {
                let coords = Coordinates::new(*latitude, *longitude)?;
                pipeline
                    .weather_by_coordinates(coords, label)
                    .await
                    .map(ToolResponse::Weather)
            }
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdvisoryError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_location_request() {
        let request = ToolRequest::from_json(r#"{"tool":"resolveLocation","location":"八王子市"}"#)
            .unwrap();
        assert_eq!(
            request,
            ToolRequest::ResolveLocation {
                location: "八王子市".to_string()
            }
        );
        assert_eq!(request.tool_id(), "get-municipality");
    }

    #[test]
    fn test_parse_coordinates_request() {
        let request = ToolRequest::from_json(
            r#"{"tool":"getWeatherByCoordinates","latitude":35.66,"longitude":139.31,"label":"東京都八王子市"}"#,
        )
        .unwrap();
        assert!(matches!(request, ToolRequest::GetWeatherByCoordinates { .. }));
        assert_eq!(request.tool_id(), "get-weather-by-coordinates");
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        let result = ToolRequest::from_json(r#"{"tool":"deleteEverything"}"#);
        assert!(matches!(result, Err(AdvisoryError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_location_is_rejected() {
        let result = ToolRequest::from_json(r#"{"tool":"getWeatherByLocation","location":"  "}"#);
        assert!(matches!(result, Err(AdvisoryError::InvalidInput(_))));
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let result = ToolRequest::from_json(
            r#"{"tool":"getWeatherByCoordinates","latitude":135.0,"longitude":139.31,"label":"x"}"#,
        );
        assert!(matches!(result, Err(AdvisoryError::InvalidInput(_))));
    }

    #[test]
    fn test_response_serializes_without_wrapper() {
        let response = ToolResponse::Weather(WeatherReading {
            temperature: 20.0,
            feels_like: 19.0,
            humidity: 50.0,
            wind_speed: 2.0,
            wind_gust: 4.0,
            conditions: "快晴".to_string(),
            location: "Tokyo".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["conditions"], "快晴");
        assert_eq!(json["feelsLike"], 19.0);
    }

    #[test]
    fn test_tool_ids_are_unique() {
        for (i, a) in TOOLS.iter().enumerate() {
            for b in &TOOLS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
