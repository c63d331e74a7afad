//! Provider endpoints, credentials, and request limits
//!
//! `Settings` carries everything the HTTP clients need. Defaults point at the
//! public providers; the CLI fills in credentials and overrides from flags or
//! environment variables.

use std::time::Duration;

/// Default Open-Meteo geocoding host (coarse city lookup)
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";

/// Default Open-Meteo forecast host
pub const DEFAULT_FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

/// Default NAVITIME geocoding host on RapidAPI (address autocomplete)
pub const DEFAULT_ADDRESS_BASE_URL: &str = "https://navitime-geocoding.p.rapidapi.com";

/// RapidAPI host header value for the NAVITIME geocoder
pub const DEFAULT_RAPIDAPI_HOST: &str = "navitime-geocoding.p.rapidapi.com";

/// Environment variable holding the RapidAPI key
pub const RAPIDAPI_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Number of forecast days requested for the hourly series
pub const DEFAULT_FORECAST_DAYS: u8 = 1;

/// Runtime settings for all provider clients
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the coarse city geocoder
    pub geocoding_base_url: String,
    /// Base URL of the weather forecast provider
    pub forecast_base_url: String,
    /// Base URL of the address autocomplete geocoder
    pub address_base_url: String,
    /// Value sent as `x-rapidapi-host`
    pub rapidapi_host: String,
    /// RapidAPI key; required only by the address geocoder
    pub rapidapi_key: Option<String>,
    /// Upper bound for each outbound request
    pub timeout: Duration,
    /// Days of hourly data requested in scheduled mode
    pub forecast_days: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geocoding_base_url: DEFAULT_GEOCODING_BASE_URL.to_string(),
            forecast_base_url: DEFAULT_FORECAST_BASE_URL.to_string(),
            address_base_url: DEFAULT_ADDRESS_BASE_URL.to_string(),
            rapidapi_host: DEFAULT_RAPIDAPI_HOST.to_string(),
            rapidapi_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }
}

impl Settings {
    /// Point every provider at the same base URL (used with a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.geocoding_base_url = base_url.clone();
        self.forecast_base_url = base_url.clone();
        self.address_base_url = base_url;
        self
    }

    /// Set the RapidAPI key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.rapidapi_key = Some(key.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the API key if it is present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.rapidapi_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Build the shared HTTP client honoring the configured timeout
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tenki/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
