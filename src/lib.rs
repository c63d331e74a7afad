//! tenki library
//!
//! Resolves ambiguous place names, retrieves current weather, and condenses
//! hourly forecasts into daily summaries for activity planning.

pub mod activities;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod tools;

pub use activities::{ActivityPlanner, LocalPlanner};
pub use config::Settings;
pub use data::{
    AddressLevel, Coordinates, DailyForecast, ResolvedLocation, WeatherClient, WeatherReading,
};
pub use error::{AdvisoryError, Result};
pub use pipeline::{Advisory, AdvisoryPipeline};
pub use tools::{ToolRequest, ToolResponse};
