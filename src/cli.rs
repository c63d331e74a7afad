//! Command-line interface parsing for tenki
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into provider `Settings` and a weather lookup target.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::config::{
    Settings, DEFAULT_ADDRESS_BASE_URL, DEFAULT_FORECAST_BASE_URL, DEFAULT_FORECAST_DAYS,
    DEFAULT_GEOCODING_BASE_URL, DEFAULT_TIMEOUT_SECS,
};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// `weather` needs either a place name or a full coordinate triple
    #[error("Specify a place name, or all of --lat, --lon and --label")]
    MissingWeatherTarget,

    /// Place name and coordinates were both given
    #[error("A place name cannot be combined with --lat/--lon/--label")]
    ConflictingWeatherTarget,

    /// Timeout must be positive
    #[error("Invalid timeout: {0} seconds (must be at least 1)")]
    InvalidTimeout(u64),
}

/// tenki - Resolve places, check the weather, and plan the day
#[derive(Parser, Debug)]
#[command(name = "tenki")]
#[command(about = "Place resolution, current weather and daily activity planning")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// RapidAPI key for the address geocoder
    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "TENKI_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Days of hourly data used for daily summaries
    #[arg(
        long,
        env = "TENKI_FORECAST_DAYS",
        default_value_t = DEFAULT_FORECAST_DAYS,
        value_parser = clap::value_parser!(u8).range(1..=16),
        global = true
    )]
    pub forecast_days: u8,

    /// Open-Meteo geocoding base URL
    #[arg(
        long,
        env = "TENKI_GEOCODING_URL",
        default_value = DEFAULT_GEOCODING_BASE_URL,
        hide = true,
        global = true
    )]
    pub geocoding_url: String,

    /// Open-Meteo forecast base URL
    #[arg(
        long,
        env = "TENKI_FORECAST_URL",
        default_value = DEFAULT_FORECAST_BASE_URL,
        hide = true,
        global = true
    )]
    pub forecast_url: String,

    /// NAVITIME geocoding base URL
    #[arg(
        long,
        env = "TENKI_ADDRESS_URL",
        default_value = DEFAULT_ADDRESS_BASE_URL,
        hide = true,
        global = true
    )]
    pub address_url: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve place names into coordinates and address levels
    Resolve {
        /// One or more place names, resolved concurrently
        #[arg(required = true)]
        places: Vec<String>,
    },

    /// Show current weather for a city name or explicit coordinates
    ///
    /// Examples:
    ///   tenki weather Tokyo
    ///   tenki weather --lat 35.666 --lon 139.316 --label 八王子市
    Weather(WeatherArgs),

    /// Resolve a place and show its weather, or ask for a more specific place
    Ask {
        /// Free-text place name
        place: String,
    },

    /// Print the daily forecast summary for a city as JSON
    Forecast {
        /// City name
        city: String,
    },

    /// Suggest activities for a city from its daily forecast
    Plan {
        /// City name
        city: String,
    },

    /// Print the language-model planning prompt for a city
    Prompt {
        /// City name
        city: String,
    },

    /// Execute an agent tool request given as JSON
    Tool {
        /// Request such as {"tool":"resolveLocation","location":"八王子市"}
        request: String,
    },
}

/// Arguments of the `weather` subcommand
#[derive(Args, Debug)]
pub struct WeatherArgs {
    /// City name to geocode
    pub place: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Label attached to a coordinate lookup
    #[arg(long)]
    pub label: Option<String>,
}

/// What the `weather` subcommand should look up
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherTarget {
    /// Geocode a city name first
    Place(String),
    /// Skip geocoding
    Coordinates {
        latitude: f64,
        longitude: f64,
        label: String,
    },
}

impl WeatherArgs {
    /// Decide between a name lookup and a coordinate lookup
    pub fn target(&self) -> Result<WeatherTarget, CliError> {
        let has_coords = self.lat.is_some() || self.lon.is_some() || self.label.is_some();
        match (&self.place, has_coords) {
            (Some(_), true) => Err(CliError::ConflictingWeatherTarget),
            (Some(place), false) => Ok(WeatherTarget::Place(place.clone())),
            (None, _) => match (self.lat, self.lon, &self.label) {
                (Some(latitude), Some(longitude), Some(label)) => Ok(WeatherTarget::Coordinates {
                    latitude,
                    longitude,
                    label: label.clone(),
                }),
                _ => Err(CliError::MissingWeatherTarget),
            },
        }
    }
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with flag and environment overrides applied
    /// * `Err(CliError)` if a value is out of range
    pub fn from_cli(args: &GlobalArgs) -> Result<Self, CliError> {
        if args.timeout == 0 {
            return Err(CliError::InvalidTimeout(args.timeout));
        }
        Ok(Settings {
            geocoding_base_url: args.geocoding_url.clone(),
            forecast_base_url: args.forecast_url.clone(),
            address_base_url: args.address_url.clone(),
            rapidapi_key: args.api_key.clone(),
            timeout: Duration::from_secs(args.timeout),
            forecast_days: args.forecast_days,
            ..Settings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_resolve_multiple_places() {
        let cli = Cli::parse_from(["tenki", "resolve", "東京都", "八王子市"]);
        match cli.command {
            Command::Resolve { places } => assert_eq!(places, vec!["東京都", "八王子市"]),
            other => panic!("Expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_resolve_requires_a_place() {
        assert!(Cli::try_parse_from(["tenki", "resolve"]).is_err());
    }

    #[test]
    fn test_weather_target_place() {
        let cli = Cli::parse_from(["tenki", "weather", "Tokyo"]);
        let Command::Weather(args) = cli.command else {
            panic!("Expected weather command");
        };
        assert_eq!(args.target().unwrap(), WeatherTarget::Place("Tokyo".to_string()));
    }

    #[test]
    fn test_weather_target_coordinates_with_negative_longitude() {
        let cli = Cli::parse_from([
            "tenki", "weather", "--lat", "49.28", "--lon", "-123.12", "--label", "Vancouver",
        ]);
        let Command::Weather(args) = cli.command else {
            panic!("Expected weather command");
        };
        assert_eq!(
            args.target().unwrap(),
            WeatherTarget::Coordinates {
                latitude: 49.28,
                longitude: -123.12,
                label: "Vancouver".to_string(),
            }
        );
    }

    #[test]
    fn test_weather_target_incomplete_coordinates() {
        let cli = Cli::parse_from(["tenki", "weather", "--lat", "35.0", "--lon", "139.0"]);
        let Command::Weather(args) = cli.command else {
            panic!("Expected weather command");
        };
        assert!(matches!(args.target(), Err(CliError::MissingWeatherTarget)));
    }

    #[test]
    fn test_weather_target_conflict() {
        let cli = Cli::parse_from(["tenki", "weather", "Tokyo", "--lat", "35.0"]);
        let Command::Weather(args) = cli.command else {
            panic!("Expected weather command");
        };
        assert!(matches!(args.target(), Err(CliError::ConflictingWeatherTarget)));
    }

    #[test]
    fn test_settings_from_cli_applies_overrides() {
        let cli = Cli::parse_from([
            "tenki",
            "--api-key",
            "secret",
            "--timeout",
            "3",
            "--forecast-days",
            "2",
            "plan",
            "Tokyo",
        ]);
        let settings = Settings::from_cli(&cli.global).unwrap();
        assert_eq!(settings.api_key(), Some("secret"));
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.forecast_days, 2);
    }

    #[test]
    fn test_settings_from_cli_rejects_zero_timeout() {
        let cli = Cli::parse_from(["tenki", "--timeout", "0", "plan", "Tokyo"]);
        assert!(matches!(
            Settings::from_cli(&cli.global),
            Err(CliError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_forecast_days_out_of_range() {
        assert!(Cli::try_parse_from(["tenki", "--forecast-days", "30", "plan", "Tokyo"]).is_err());
    }
}
