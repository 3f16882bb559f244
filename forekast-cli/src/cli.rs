use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use forekast_core::{
    Config, FileSettings, GeoLocation, Location, LocationId, LocationStore, Settings,
    WeatherApi, WeatherApiClient, WeatherRepository,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forekast", version, about = "Track locations and check their weather")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather service API key.
    Configure,

    /// Search locations by name or coordinates.
    Search(Target),

    /// Search and start tracking a location.
    Add {
        #[command(flatten)]
        target: Target,

        /// Take the first match instead of asking.
        #[arg(long)]
        first: bool,
    },

    /// Stop tracking a location.
    Remove {
        /// Location id as shown by `forekast list`.
        id: i64,
    },

    /// List tracked locations.
    List,

    /// Show current weather for every tracked location.
    Show,

    /// Show full conditions and forecast for one tracked location.
    Details {
        id: i64,

        /// Forecast length in days; defaults to the configured value.
        #[arg(long)]
        days: Option<u8>,
    },

    /// Keep showing current weather, refreshing periodically.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 600)]
        interval: u64,
    },
}

/// Either a free-text query or a coordinate pair.
#[derive(Debug, Args)]
pub struct Target {
    /// Location name, postcode, airport code, ...
    #[arg(required_unless_present_all = ["lat", "lon"], conflicts_with_all = ["lat", "lon"])]
    pub query: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl Target {
    fn geo(&self) -> Option<GeoLocation> {
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Some(GeoLocation { latitude, longitude }),
            _ => None,
        }
    }

    async fn resolve(&self, api: &impl WeatherApi) -> Result<Vec<Location>> {
        if let Some(geo) = self.geo() {
            if !(-90.0..=90.0).contains(&geo.latitude) || !(-180.0..=180.0).contains(&geo.longitude)
            {
                bail!("Coordinates out of range: {}", geo.as_query());
            }
            let hit = api.search_location_at(geo).await?;
            return Ok(hit.into_iter().collect());
        }

        let query = self.query.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            bail!("Search query must not be empty");
        }
        Ok(api.search_location(query).await?)
    }
}

struct Choice(Location);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display_name())
    }
}

fn open_store(config: &Config) -> Result<LocationStore<FileSettings>> {
    let path = config.data_file_path()?;
    tracing::debug!(path = %path.display(), "opening location store");
    LocationStore::new(FileSettings::new(path)).context("Failed to open location store")
}

fn open_client(config: &Config) -> Result<WeatherApiClient> {
    WeatherApiClient::from_config(config).context("Failed to create weather client")
}

fn find_tracked(store: &LocationStore<FileSettings>, id: i64) -> Result<Location> {
    store.find(LocationId(id))?.ok_or_else(|| {
        anyhow!("Location {id} is not tracked.\nHint: run `forekast list` to see tracked ids.")
    })
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Search(target) => {
                let client = open_client(&config)?;
                let hits = target.resolve(&client).await?;
                if hits.is_empty() {
                    println!("No matching locations.");
                }
                for location in &hits {
                    println!("{}", render::location_line(location));
                }
            }
            Command::Add { target, first } => {
                let client = open_client(&config)?;
                let store = open_store(&config)?;
                let mut hits = target.resolve(&client).await?;

                let picked = match hits.len() {
                    0 => bail!("No matching locations."),
                    1 => hits.remove(0),
                    _ if first => hits.remove(0),
                    _ => {
                        let options = hits.into_iter().map(Choice).collect();
                        inquire::Select::new("Pick a location:", options).prompt()?.0
                    }
                };

                store.add_location(picked.clone())?;
                println!("Tracking {}", render::location_line(&picked));
            }
            Command::Remove { id } => {
                let store = open_store(&config)?;
                let location = find_tracked(&store, id)?;
                store.remove_location(&location)?;
                println!("Stopped tracking {}", render::location_line(&location));
            }
            Command::List => {
                let store = open_store(&config)?;
                let locations = store.locations()?;
                if locations.is_empty() {
                    println!("No tracked locations. Add one with `forekast add <name>`.");
                }
                for location in &locations {
                    println!("{}", render::location_line(location));
                }
            }
            Command::Show => {
                let store = open_store(&config)?;
                let repo = WeatherRepository::new(Arc::new(open_client(&config)?));
                show_all(&repo, &store.locations()?).await;
            }
            Command::Details { id, days } => {
                let store = open_store(&config)?;
                let location = find_tracked(&store, id)?;
                let client = open_client(&config)?;
                let days = days.unwrap_or_else(|| config.forecast_days());

                let data = client
                    .forecast(location.location_id(), days)
                    .await
                    .with_context(|| format!("Failed to fetch weather for {}", location.name))?;
                println!("{}", render::details(&location, &data));
            }
            Command::Watch { interval } => {
                let store = open_store(&config)?;
                let repo = WeatherRepository::new(Arc::new(open_client(&config)?));
                watch(&store, &repo, Duration::from_secs(interval.max(1))).await?;
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> Result<()> {
    let key = inquire::Password::new("weatherapi.com API key:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(key);

    let base = inquire::Text::new("Service base URL:")
        .with_default(config.base_url())
        .prompt()?;
    config.base_url = Some(base.trim().to_string()).filter(|b| !b.is_empty());

    config.forecast_days = inquire::CustomType::<u8>::new("Forecast days:")
        .with_default(config.forecast_days())
        .with_error_message("Please enter a number of days")
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show_all<A: WeatherApi>(repo: &WeatherRepository<A>, locations: &[Location]) {
    if locations.is_empty() {
        println!("No tracked locations. Add one with `forekast add <name>`.");
        return;
    }
    for (location, result) in repo.current_weather_for_all(locations).await {
        println!("{}", render::summary_line(&location, &result));
    }
}

/// Manual refresh: forget cached results and pick up list edits made by other processes.
fn refresh<S: Settings, A: WeatherApi>(
    store: &LocationStore<S>,
    repo: &WeatherRepository<A>,
) -> Result<()> {
    repo.clear_cache();
    store.reload().context("Failed to reload tracked locations")?;
    Ok(())
}

async fn watch<S: Settings, A: WeatherApi>(
    store: &LocationStore<S>,
    repo: &WeatherRepository<A>,
    interval: Duration,
) -> Result<()> {
    let mut locations_rx = store.observe();
    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh(store, repo)?;
            }
            changed = locations_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, stopping watch");
                break;
            }
        }

        let locations = locations_rx.borrow_and_update().clone();
        println!("-- {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        show_all(repo, &locations).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["forekast", "search", "--lat", "51.5", "--lon", "-0.11"])
            .expect("should parse");
        let Command::Search(target) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(target.geo(), Some(GeoLocation { latitude: 51.5, longitude: -0.11 }));
        assert_eq!(target.query, None);
    }

    #[test]
    fn search_requires_query_or_coordinates() {
        assert!(Cli::try_parse_from(["forekast", "search"]).is_err());
        assert!(Cli::try_parse_from(["forekast", "search", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn query_and_coordinates_conflict() {
        let res = Cli::try_parse_from([
            "forekast", "add", "Paris", "--lat", "1.0", "--lon", "2.0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["forekast", "show", "-vv"]).expect("should parse");
        assert_eq!(cli.verbose, 2);
    }

    #[derive(Debug, Default)]
    struct FixedApi;

    #[async_trait::async_trait]
    impl WeatherApi for FixedApi {
        async fn current_weather(&self, _id: LocationId) -> forekast_core::WeatherResult {
            Err(forekast_core::ApiError::Network("offline".into()))
        }

        async fn search_location(
            &self,
            _query: &str,
        ) -> Result<Vec<Location>, forekast_core::ApiError> {
            Ok(Vec::new())
        }

        async fn search_location_at(
            &self,
            _geo: GeoLocation,
        ) -> Result<Option<Location>, forekast_core::ApiError> {
            Ok(None)
        }

        async fn forecast(&self, id: LocationId, _days: u8) -> forekast_core::WeatherResult {
            self.current_weather(id).await
        }
    }

    #[tokio::test]
    async fn refresh_clears_cache_and_sees_other_process_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = LocationStore::new(FileSettings::new(&path)).unwrap();
        let other = LocationStore::new(FileSettings::new(&path)).unwrap();
        let repo = WeatherRepository::new(std::sync::Arc::new(FixedApi));

        let mut rx = store.observe();
        rx.borrow_and_update();
        assert!(repo.current_weather(LocationId(1)).await.is_err());

        other
            .add_location(Location { id: 1, name: "Oslo".into(), region: None, country: None })
            .unwrap();
        refresh(&store, &repo).unwrap();

        assert!(repo.is_empty());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn details_days_is_optional() {
        let cli = Cli::try_parse_from(["forekast", "details", "42", "--days", "5"])
            .expect("should parse");
        assert!(matches!(cli.command, Command::Details { id: 42, days: Some(5) }));
    }
}
