//! Geocoding clients
//!
//! Two providers turn free text into coordinates:
//! - `LocationResolver` queries the NAVITIME address autocomplete API (via
//!   RapidAPI), which also reports an administrative hierarchy.
//! - `CityGeocoder` queries the Open-Meteo geocoder, a keyless coarse city
//!   lookup used right before weather retrieval.
//!
//! Both trust the provider ranking and take the first candidate.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{Settings, RAPIDAPI_KEY_ENV};
use crate::error::{AdvisoryError, Result};

use super::{fetch_body, parse_json, provider_coordinates, AddressLevel, ResolvedLocation};

const ADDRESS_PROVIDER: &str = "NAVITIME geocoding";
const CITY_PROVIDER: &str = "Open-Meteo geocoding";

/// Autocomplete response from the NAVITIME geocoder
#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    items: Vec<AddressItem>,
}

/// A single address candidate
#[derive(Debug, Deserialize)]
struct AddressItem {
    name: String,
    coord: AddressCoord,
    #[serde(default)]
    details: Vec<AddressDetail>,
}

#[derive(Debug, Deserialize)]
struct AddressCoord {
    lat: f64,
    lon: f64,
}

/// One entry of the administrative hierarchy, coarsest first
#[derive(Debug, Deserialize)]
struct AddressDetail {
    level: LevelValue,
}

/// The provider sends levels as strings; numbers are accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LevelValue {
    Number(i64),
    Text(String),
}

impl LevelValue {
    fn to_address_level(&self) -> Result<AddressLevel> {
        let raw = match self {
            LevelValue::Number(n) => *n,
            LevelValue::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                AdvisoryError::Upstream(format!("address level '{}' is not a number", text))
            })?,
        };
        u8::try_from(raw)
            .ok()
            .and_then(AddressLevel::new)
            .ok_or_else(|| {
                AdvisoryError::Upstream(format!("address level {} is outside 1..=7", raw))
            })
    }
}

/// Resolves ambiguous place names into coordinates and an address level
#[derive(Debug, Clone)]
pub struct LocationResolver {
    client: Client,
    base_url: String,
    host: String,
    api_key: Option<String>,
}

impl LocationResolver {
    /// Create a resolver from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(settings.http_client()?, settings))
    }

    /// Create a resolver with a custom HTTP client
    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.address_base_url.trim_end_matches('/').to_string(),
            host: settings.rapidapi_host.clone(),
            api_key: settings.api_key().map(str::to_string),
        }
    }

    /// Resolve a free-text place name
    ///
    /// # Returns
    /// * `Ok(ResolvedLocation)` built from the first candidate
    /// * `Err(AdvisoryError::Configuration)` if no API key is configured;
    ///   checked before any request is sent
    /// * `Err(AdvisoryError::NotFound)` if the provider has no candidate
    pub async fn resolve(&self, place_name: &str) -> Result<ResolvedLocation> {
        let place_name = place_name.trim();
        if place_name.is_empty() {
            return Err(AdvisoryError::InvalidInput("place name must not be empty".to_string()));
        }
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AdvisoryError::Configuration(format!(
                "{} environment variable is not set",
                RAPIDAPI_KEY_ENV
            ))
        })?;

        debug!(place = place_name, "Resolving address");
        let request = self
            .client
            .get(format!("{}/address/autocomplete", self.base_url))
            .query(&[("word", place_name)])
            .header("x-rapidapi-host", &self.host)
            .header("x-rapidapi-key", api_key);

        let body = fetch_body(request, ADDRESS_PROVIDER).await?;
        let location = parse_address_response(&body, place_name)?;

        info!(
            place = place_name,
            address = %location.address,
            level = %location.address_level,
            "Resolved address"
        );
        Ok(location)
    }
}

/// Parse an autocomplete body into the first candidate's location
fn parse_address_response(body: &str, place_name: &str) -> Result<ResolvedLocation> {
    let response: AddressResponse = parse_json(body, ADDRESS_PROVIDER)?;
    let first = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| AdvisoryError::not_found(place_name))?;

    // The last hierarchy entry is the most specific one
    let address_level = match first.details.last() {
        Some(detail) => detail.level.to_address_level()?,
        None => AddressLevel::default(),
    };

    let coords = provider_coordinates(first.coord.lat, first.coord.lon, ADDRESS_PROVIDER)?;

    Ok(ResolvedLocation {
        latitude: coords.latitude,
        longitude: coords.longitude,
        address: first.name,
        address_level,
    })
}

/// First match of a coarse city lookup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodedCity {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Provider display name
    pub name: String,
}

/// Search response from the Open-Meteo geocoder
#[derive(Debug, Deserialize)]
struct CitySearchResponse {
    results: Option<Vec<GeocodedCity>>,
}

/// Keyless city-name geocoder
#[derive(Debug, Clone)]
pub struct CityGeocoder {
    client: Client,
    base_url: String,
}

impl CityGeocoder {
    /// Create a geocoder from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(settings.http_client()?, settings))
    }

    /// Create a geocoder with a custom HTTP client
    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.geocoding_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up the best match for a city name
    pub async fn lookup(&self, name: &str) -> Result<GeocodedCity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdvisoryError::InvalidInput("location must not be empty".to_string()));
        }

        debug!(city = name, "Geocoding city");
        let request = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .query(&[("name", name), ("count", "1")]);

        let body = fetch_body(request, CITY_PROVIDER).await?;
        parse_city_response(&body, name)
    }
}

/// Parse a search body into its first result
fn parse_city_response(body: &str, name: &str) -> Result<GeocodedCity> {
    let response: CitySearchResponse = parse_json(body, CITY_PROVIDER)?;
    let city = response
        .results
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AdvisoryError::not_found(name))?;

    provider_coordinates(city.latitude, city.longitude, CITY_PROVIDER)?;
    Ok(city)
}
