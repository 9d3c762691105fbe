use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};

use weatherdash_core::{
    Config, Dashboard, FavoritesStore, Granularity, Intent, LocationQuery, OpenWeatherGeocoder,
    PlaceNameResolver, TemperatureUnit, ViewState, geocode::suggest, normalize_current,
    provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// City name or coordinates; with neither, the configured default city is used.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City name, e.g. "Rabat".
    #[arg(conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Temperature unit: c or f. Defaults to the configured unit.
    #[arg(long, short)]
    pub unit: Option<String>,
}

impl LocationArgs {
    fn unit(&self, config: &Config) -> anyhow::Result<TemperatureUnit> {
        match &self.unit {
            Some(u) => TemperatureUnit::try_from(u.as_str()),
            None => Ok(config.unit),
        }
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    /// Direct provider query, bypassing the dashboard.
    fn query(&self, config: &Config) -> LocationQuery {
        match (&self.city, self.coordinates()) {
            (_, Some((lat, lon))) => LocationQuery::Coordinates { lat, lon },
            (Some(city), None) if !city.trim().is_empty() => LocationQuery::City(city.trim().to_string()),
            _ => LocationQuery::City(config.default_city.clone()),
        }
    }
}

fn parse_granularity(value: &str) -> Result<Granularity, String> {
    Granularity::try_from(value).map_err(|e| e.to_string())
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and display defaults.
    Configure,

    /// Current conditions plus the multi-day forecast.
    Show {
        #[command(flatten)]
        location: LocationArgs,

        /// Number of days to request (1-16).
        #[arg(long)]
        days: Option<u8>,

        /// Include the 3-hourly breakdown under each day.
        #[arg(long)]
        hourly: bool,
    },

    /// Observed conditions right now.
    Now {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Provider response as-is, pretty-printed JSON.
    Raw {
        #[command(flatten)]
        location: LocationArgs,

        /// current, three_hourly, hourly or daily.
        #[arg(long, short, default_value = "daily", value_parser = parse_granularity)]
        granularity: Granularity,

        /// Days for the daily granularity (1-16, default 7).
        #[arg(long)]
        days: Option<u8>,
    },

    /// Resolve coordinates to a place name.
    Place {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Find places matching a query.
    Search { query: String },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { city: String },
    Remove { city: String },
    Toggle { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Show { location, days, hourly } => show(&config, &location, days, hourly).await,
            Command::Now { location } => now(&config, &location).await,
            Command::Raw { location, granularity, days } => {
                let provider = provider_from_config(&config)?;
                let payload = provider
                    .fetch_forecast(&location.query(&config), granularity, days)
                    .await?;
                println!("{:#}", payload.body);
                Ok(())
            }
            Command::Place { lat, lon } => {
                let name = geocoder(&config)?.resolve(lat, lon).await;
                if name.is_resolved() {
                    println!("{name}");
                    Ok(())
                } else {
                    Err(anyhow!("{name} for ({lat}, {lon})"))
                }
            }
            Command::Search { query } => search(&config, &query).await,
            Command::Favorites { action } => favorites(&config, action),
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    config.default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read default city")?;

    let units = vec![TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit];
    let start = units.iter().position(|u| *u == config.unit).unwrap_or(0);
    config.unit = Select::new("Temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read temperature unit")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    config: &Config,
    args: &LocationArgs,
    days: Option<u8>,
    hourly: bool,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.unit = args.unit(&config)?;
    if let Some(days) = days {
        config.day_count = days;
    }

    let provider = provider_from_config(&config)?;
    let mut dashboard = Dashboard::new(&config);

    let request = match (&args.city, args.coordinates()) {
        (_, Some((lat, lon))) => {
            let name = geocoder(&config)?.resolve(lat, lon).await;
            dashboard.dispatch(Intent::PickLocation { lat, lon })?;
            dashboard.dispatch(Intent::ConfirmPick(name))?
        }
        (Some(city), None) => dashboard.dispatch(Intent::Search(city.clone()))?,
        (None, None) => Some(dashboard.initial_load()),
    };

    let Some(request) = request else {
        return Err(anyhow!("Nothing to show. Hint: pass a city name."));
    };
    tracing::debug!(?request, "Starting fetch cycle");

    dashboard.run_cycle(provider.as_ref(), request).await;

    match &dashboard.state().view {
        ViewState::Ready(view) => {
            let favorite = open_favorites(&config)?.is_favorite(&view.current.city);
            print!("{}", render::forecast(view, favorite, hourly));
            Ok(())
        }
        ViewState::Failed { error, retryable, .. } => {
            let hint = if *retryable { "\nHint: check your connection and try again." } else { "" };
            Err(anyhow!("Could not load forecast: {error}{hint}"))
        }
        other => Err(anyhow!("Forecast cycle did not complete: {other:?}")),
    }
}

async fn now(config: &Config, args: &LocationArgs) -> anyhow::Result<()> {
    let unit = args.unit(config)?;
    let provider = provider_from_config(config)?;

    let payload = provider
        .fetch_forecast(&args.query(config), Granularity::Current, None)
        .await?;
    let current = normalize_current(&payload.body, unit)?;
    let favorite = open_favorites(config)?.is_favorite(&current.city);

    print!("{}", render::current(&current, favorite));
    Ok(())
}

async fn search(config: &Config, query: &str) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        return Ok(());
    }

    let store = open_favorites(config)?;
    for city in suggest(query, store.cities()) {
        println!("★ {city}");
    }

    for place in geocoder(config)?.search(query).await? {
        println!("  {}  ({:.4}, {:.4})", place.label(), place.lat, place.lon);
    }

    Ok(())
}

fn favorites(config: &Config, action: FavoritesAction) -> anyhow::Result<()> {
    let mut store = open_favorites(config)?;

    match action {
        FavoritesAction::List => {
            if store.cities().is_empty() {
                println!("No saved cities");
            }
            for city in store.cities() {
                println!("{city}");
            }
        }
        FavoritesAction::Add { city } => {
            if store.add(&city)? {
                println!("Added {city}");
            } else {
                println!("{city} is already a favorite");
            }
        }
        FavoritesAction::Remove { city } => {
            if store.remove(&city)? {
                println!("Removed {city}");
            } else {
                println!("{city} was not a favorite");
            }
        }
        FavoritesAction::Toggle { city } => {
            let state = if store.toggle(&city)? { "added to" } else { "removed from" };
            println!("{city} {state} favorites");
        }
    }

    Ok(())
}

fn open_favorites(config: &Config) -> anyhow::Result<FavoritesStore> {
    let path = config.favorites_file_path()?;
    Ok(FavoritesStore::open(path)?)
}

fn geocoder(config: &Config) -> anyhow::Result<OpenWeatherGeocoder> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `weatherdash configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    Ok(OpenWeatherGeocoder::with_base_url(api_key, &config.api_base_url)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_parses_granularity_flag() {
        let cli = Cli::try_parse_from(["weatherdash", "raw", "Rabat", "-g", "3h", "--days", "3"]).unwrap();
        let Command::Raw { location, granularity, days } = cli.command else {
            panic!("expected raw command");
        };
        assert_eq!(granularity, Granularity::ThreeHourly);
        assert_eq!(days, Some(3));
        assert_eq!(location.city.as_deref(), Some("Rabat"));
    }

    #[test]
    fn raw_defaults_to_daily_and_rejects_unknown_granularity() {
        let cli = Cli::try_parse_from(["weatherdash", "raw"]).unwrap();
        assert!(matches!(cli.command, Command::Raw { granularity: Granularity::Daily, .. }));

        let err = Cli::try_parse_from(["weatherdash", "raw", "-g", "weekly"]).unwrap_err();
        assert!(err.to_string().contains("Supported: current, three_hourly, hourly, daily"));
    }

    #[test]
    fn location_query_prefers_coordinates_then_city_then_default() {
        let config = Config::default();
        let args = |city: Option<&str>, coords: Option<(f64, f64)>| LocationArgs {
            city: city.map(str::to_string),
            lat: coords.map(|c| c.0),
            lon: coords.map(|c| c.1),
            unit: None,
        };

        assert_eq!(
            args(None, Some((34.0, -6.8))).query(&config),
            LocationQuery::Coordinates { lat: 34.0, lon: -6.8 }
        );
        assert_eq!(args(Some(" Paris "), None).query(&config), LocationQuery::City("Paris".into()));
        assert_eq!(args(Some("  "), None).query(&config), LocationQuery::City(config.default_city.clone()));
    }
}
