//! tenki - Weather lookups and activity planning from the command line
//!
//! Resolves Japanese place names, shows current weather, and turns hourly
//! forecasts into daily summaries and activity suggestions.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tenki::activities::planning_prompt;
use tenki::cli::{Cli, Command, WeatherTarget};
use tenki::data::LocationResolver;
use tenki::{
    Advisory, AdvisoryError, AdvisoryPipeline, Coordinates, LocalPlanner, Settings, ToolRequest,
    WeatherClient, WeatherReading,
};

type Pipeline = AdvisoryPipeline<LocationResolver, WeatherClient, LocalPlanner>;

/// Sets up log output on stderr; `RUST_LOG` takes precedence over `--verbose`
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tenki=debug" } else { "tenki=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the pipeline with one shared HTTP client
fn build_pipeline(settings: &Settings) -> tenki::Result<Pipeline> {
    let client = settings.http_client()?;
    Ok(AdvisoryPipeline::new(
        LocationResolver::with_client(client.clone(), settings),
        WeatherClient::with_client(client, settings),
        LocalPlanner::default(),
    ))
}

/// Formats a reading for the terminal
fn render_reading(reading: &WeatherReading) -> String {
    format!(
        "📍 {}\n天気：{}\n気温：{:.1}°C (体感 {:.1}°C)\n湿度：{:.0}%\n風速：{:.1} m/s (最大瞬間 {:.1} m/s)",
        reading.location,
        reading.conditions,
        reading.temperature,
        reading.feels_like,
        reading.humidity,
        reading.wind_speed,
        reading.wind_gust,
    )
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_cli(&cli.global)?;
    let pipeline = build_pipeline(&settings)?;

    match cli.command {
        Command::Resolve { places } => {
            // Lookups are independent, so fan them out
            let lookups = places.iter().map(|place| pipeline.resolve_location(place));
            let results = futures::future::join_all(lookups).await;

            let mut failures = 0;
            for (place, result) in places.iter().zip(results) {
                match result {
                    Ok(location) => println!("{}", serde_json::to_string(&location)?),
                    Err(e) => {
                        eprintln!("{}: {}", place, e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{} of {} lookups failed", failures, places.len()).into());
            }
        }
        Command::Weather(args) => {
            let reading = match args.target()? {
                WeatherTarget::Place(place) => pipeline.weather_by_location(&place).await?,
                WeatherTarget::Coordinates {
                    latitude,
                    longitude,
                    label,
                } => {
                    let coords = Coordinates::new(latitude, longitude)?;
                    pipeline.weather_by_coordinates(coords, &label).await?
                }
            };
            println!("{}", render_reading(&reading));
        }
        Command::Ask { place } => match pipeline.advise(&place).await? {
            Advisory::Clarification(request) => println!("{}", request.message),
            Advisory::Weather { reading, .. } => println!("{}", render_reading(&reading)),
        },
        Command::Forecast { city } => {
            let forecast = pipeline.fetch_and_aggregate(&city).await?;
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        Command::Plan { city } => {
            println!("{}", pipeline.plan(&city).await?);
        }
        Command::Prompt { city } => {
            let forecast = pipeline.fetch_and_aggregate(&city).await?;
            println!("{}", planning_prompt(&forecast)?);
        }
        Command::Tool { request } => {
            let request = ToolRequest::from_json(&request)?;
            let response = request.dispatch(&pipeline).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(err) = e.downcast_ref::<AdvisoryError>() {
                if !err.is_user_facing() {
                    eprintln!("Run with --verbose or RUST_LOG=tenki=debug for details.");
                }
            }
            ExitCode::FAILURE
        }
    }
}
