use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tokio::task::JoinHandle;
use tracing::debug;
use weatherview_core::{
    Config, Coordinates, DisplayFields, FetchOutcome, FixedLocation, IpLocationResolver,
    LocationResolver, WeatherController, render,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherview", version, about = "Current weather for your location or any city")]
pub struct Cli {
    /// Weather API base URL. Overrides config and WEATHERVIEW_ENDPOINT.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Weather API key. Overrides config and WEATHERVIEW_API_KEY.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, endpoint and default city.
    Configure,

    /// Show the weather once and exit.
    Show {
        /// City to look up instead of the current location.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[command(flatten)]
        location: LocationArgs,

        /// Print JSON instead of the text screen.
        #[arg(long)]
        json: bool,
    },

    /// Show local weather, then search cities until Esc.
    Interactive {
        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude in decimal degrees; skips IP-based location lookup.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    fn resolver(&self) -> Box<dyn LocationResolver> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Box::new(FixedLocation(Coordinates::new(lat, lon))),
            _ => Box::new(IpLocationResolver::new()),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                location,
                json,
            } => {
                let controller = WeatherController::from_config(&self.config()?)?;
                show(&controller, city.as_deref(), location, *json).await
            }
            Command::Interactive { location } => {
                let controller = WeatherController::from_config(&self.config()?)?;
                interactive(&controller, location).await
            }
        }
    }

    /// File, then environment, then flags.
    fn config(&self) -> anyhow::Result<Config> {
        let mut cfg = Config::load()?;
        cfg.apply_env(|key| std::env::var(key).ok());

        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = Some(endpoint.clone());
        }
        if let Some(api_key) = &self.api_key {
            cfg.api_key = Some(api_key.clone());
        }

        Ok(cfg)
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let endpoint = Text::new("API endpoint:")
        .with_default(cfg.resolved_endpoint())
        .prompt()
        .context("Failed to read endpoint")?;

    let default_city = Text::new("Default city (optional):")
        .with_default(cfg.default_city.as_deref().unwrap_or_default())
        .with_help_message("Shown when your location can't be determined")
        .prompt()
        .context("Failed to read default city")?;

    if !api_key.trim().is_empty() {
        cfg.api_key = Some(api_key.trim().to_owned());
    }
    cfg.endpoint = Some(endpoint.trim().to_owned()).filter(|e| !e.is_empty());
    cfg.default_city = Some(default_city.trim().to_owned()).filter(|c| !c.is_empty());

    cfg.require_api_key()?;
    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn show(
    controller: &WeatherController,
    city: Option<&str>,
    location: &LocationArgs,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = match city {
        Some(city) => controller.search(city).await,
        None => controller.mount(location.resolver().as_ref()).await,
    };
    debug!(?outcome, "show finished");
    if outcome == FetchOutcome::Ignored {
        bail!("City name must not be blank");
    }

    let state = controller.state();
    let Some(snapshot) = state.snapshot() else {
        return Err(anyhow!(
            "{}",
            state.error().unwrap_or("No weather data available")
        ));
    };

    if json {
        let out = serde_json::json!({
            "snapshot": snapshot,
            "display": DisplayFields::from(snapshot),
            "error": state.error(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialize weather to JSON")?
        );
    } else {
        print!("{}", render(&state));
    }

    Ok(())
}

/// Mount on a background task so the search prompt is usable while the
/// location resolves. The clone shares state with `controller`.
fn spawn_mount(
    controller: &WeatherController,
    resolver: Box<dyn LocationResolver>,
) -> JoinHandle<FetchOutcome> {
    let controller = controller.clone();
    tokio::spawn(async move {
        let outcome = controller.mount(resolver.as_ref()).await;
        debug!(?outcome, "mount finished");
        outcome
    })
}

async fn interactive(controller: &WeatherController, location: &LocationArgs) -> anyhow::Result<()> {
    print!("{}", render(&controller.state()));
    let mount = spawn_mount(controller, location.resolver());

    let result = loop {
        let prompt = tokio::task::spawn_blocking(|| {
            Text::new("Enter City Name")
                .with_help_message("Enter on an empty line refreshes, Esc quits")
                .prompt()
        });

        let answer = match prompt.await {
            Ok(answer) => answer,
            Err(e) => break Err(e).context("City prompt task failed"),
        };

        let text = match answer {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                break Ok(());
            }
            Err(e) => break Err(e).context("Failed to read city name"),
        };

        let outcome = controller.search(text).await;
        debug!(?outcome, "search finished");

        println!();
        print!("{}", render(&controller.state()));
    };

    mount.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_negative_coordinates() {
        let cli = Cli::try_parse_from(["weatherview", "show", "--lat", "51.5", "--lon", "-0.12"])
            .expect("should parse");

        match cli.command {
            Command::Show { city, location, json } => {
                assert_eq!(city, None);
                assert_eq!(location.lat, Some(51.5));
                assert_eq!(location.lon, Some(-0.12));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn city_conflicts_with_coordinates() {
        let err = Cli::try_parse_from([
            "weatherview",
            "show",
            "--city",
            "London",
            "--lat",
            "1",
            "--lon",
            "2",
        ]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn background_mount_writes_into_shared_state() {
        let cfg = Config {
            endpoint: Some("http://127.0.0.1:1/".into()),
            api_key: Some("KEY".into()),
            ..Config::default()
        };
        let controller = WeatherController::from_config(&cfg).expect("controller");
        let resolver = Box::new(FixedLocation(Coordinates::new(51.5, -0.12)));

        let outcome = spawn_mount(&controller, resolver).await.expect("mount task");

        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(
            controller.state().error(),
            Some(weatherview_core::LOCATION_FAILED_MESSAGE)
        );
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["weatherview", "show", "--lat", "1"]).is_err());
    }

    #[test]
    fn global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "weatherview",
            "interactive",
            "--api-key",
            "KEY",
            "--endpoint",
            "http://localhost:9000/",
        ])
        .expect("should parse");

        assert_eq!(cli.api_key.as_deref(), Some("KEY"));
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/"));
        assert!(matches!(cli.command, Command::Interactive { .. }));
    }
}
