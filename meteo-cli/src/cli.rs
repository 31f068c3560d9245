use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use meteo_core::{
    Config, Coordinates, CurrentWeather, FetchError, LocationSourceKind, WeatherClient,
    WeatherFetchOrchestrator, client::client_from_config, location::source_from_config,
};
use std::{process::ExitCode, sync::Arc};

use crate::{gate::PromptPermissionGate, view::TerminalView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Current weather for a coordinate pair")]
pub struct Cli {
    /// Log workflow steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose how the device location is obtained.
    Configure,

    /// Show current weather for manually entered coordinates.
    Show {
        /// Latitude in decimal degrees.
        #[arg(long = "lat", allow_hyphen_values = true)]
        latitude: String,

        /// Longitude in decimal degrees.
        #[arg(long = "lon", allow_hyphen_values = true)]
        longitude: String,
    },

    /// Show current weather for the device location.
    Locate {
        /// Grant location access without prompting.
        #[arg(long)]
        grant: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { latitude, longitude } => {
                let (orchestrator, _view) = session(&Config::load()?, false);
                let result = orchestrator.fetch_manual(&latitude, &longitude).await;
                Ok(ExitCode::from(exit_status(&result)))
            }
            Command::Locate { grant } => {
                let config = Config::load()?;
                let (orchestrator, view) = session(&config, grant);
                let orchestrator =
                    Arc::new(orchestrator.with_location_source(source_from_config(&config)?));

                // Ctrl-C is the terminal's "screen backgrounded".
                let watcher = {
                    let orchestrator = orchestrator.clone();
                    let view = view.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            view.detach();
                            orchestrator.pause();
                        }
                    })
                };

                let result = orchestrator.use_device_location().await;
                watcher.abort();

                Ok(ExitCode::from(exit_status(&result)))
            }
        }
    }
}

/// Orchestrator for the manual path. `locate` attaches the configured source on top.
fn session(config: &Config, grant: bool) -> (WeatherFetchOrchestrator, Arc<TerminalView>) {
    let view = Arc::new(TerminalView::new());
    let client: Arc<dyn WeatherClient> = Arc::from(client_from_config(config));

    let gate = Arc::new(PromptPermissionGate::new(grant));

    let orchestrator = WeatherFetchOrchestrator::new(gate, client, view.clone())
        .with_location_request(config.location_request());

    (orchestrator, view)
}

/// Denial is a hard stop with its own status; dropped results look like an interrupt.
fn exit_status(result: &Result<CurrentWeather, FetchError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) if e.is_terminal() => 2,
        Err(e) if e.is_silent() => 130,
        Err(_) => 1,
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let kinds: Vec<&str> =
        LocationSourceKind::all().iter().map(LocationSourceKind::as_str).collect();
    let current = kinds.iter().position(|k| *k == config.location.source.as_str()).unwrap_or(0);

    let picked = Select::new("Location source:", kinds)
        .with_starting_cursor(current)
        .with_help_message("ip: approximate position from your IP address; fixed: a home position")
        .prompt()
        .context("Location source selection aborted")?;
    let kind = LocationSourceKind::try_from(picked)?;

    match kind {
        LocationSourceKind::Ip => config.location.source = LocationSourceKind::Ip,
        LocationSourceKind::Fixed => {
            let home = prompt_home(config.location.home)?;
            config.set_home(home);
        }
    }

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn prompt_home(current: Option<Coordinates>) -> anyhow::Result<Coordinates> {
    loop {
        let lat_default = current.map(|c| c.latitude.to_string());
        let lon_default = current.map(|c| c.longitude.to_string());

        let mut lat = Text::new("Home latitude:");
        let mut lon = Text::new("Home longitude:");
        if let (Some(la), Some(lo)) = (lat_default.as_deref(), lon_default.as_deref()) {
            lat = lat.with_default(la);
            lon = lon.with_default(lo);
        }

        let latitude = lat.prompt().context("Latitude entry aborted")?;
        let longitude = lon.prompt().context("Longitude entry aborted")?;

        match Coordinates::parse(&latitude, &longitude) {
            Ok(home) => return Ok(home),
            Err(e) => eprintln!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["meteo", "show", "--lat", "-33.87", "--lon", "-151.2"])
            .expect("parses");

        match cli.command {
            Command::Show { latitude, longitude } => {
                assert_eq!(latitude, "-33.87");
                assert_eq!(longitude, "-151.2");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn locate_grant_flag_and_global_verbose() {
        let cli = Cli::try_parse_from(["meteo", "locate", "--grant", "-v"]).expect("parses");

        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Locate { grant: true }));
    }

    #[test]
    fn exit_status_follows_error_kind() {
        assert_eq!(exit_status(&Err(FetchError::PermissionDenied)), 2);
        assert_eq!(exit_status(&Err(FetchError::Cancelled)), 130);
        assert_eq!(exit_status(&Err(FetchError::HostGone)), 130);
        assert_eq!(exit_status(&Err(FetchError::Transport("reset".into()))), 1);
    }

    #[tokio::test]
    async fn show_ignores_an_incomplete_location_setup() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {
                    "temperature": 21.3,
                    "windspeed": 5.1,
                    "winddirection": 180,
                    "weathercode": 1,
                    "is_day": 1,
                    "time": "2024-01-01T12:00"
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // Fixed source picked but no home saved: only `locate` cares.
        let mut config = Config::default();
        config.location.source = LocationSourceKind::Fixed;
        config.api.base_url = format!("{}/v1/forecast", mock_server.uri());
        assert!(source_from_config(&config).is_err());

        let (orchestrator, _view) = session(&config, false);
        let result = orchestrator.fetch_manual("45.81", "15.98").await;

        assert_eq!(exit_status(&result), 0);
        assert_eq!(result.expect("weather").temperature, 21.3);
    }
}
