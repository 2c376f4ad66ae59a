use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use weather_core::{CityListStore, Config, FetchState, WeatherFetcher, provider_from_config};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Track cities and their current weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key.
    Configure,

    /// Manage the tracked city list.
    Cities {
        #[command(subcommand)]
        action: CitiesAction,
    },

    /// Show current weather for a single location.
    Show {
        /// City name, optionally with country, e.g. "Paris, France".
        city: String,
    },

    /// Interactive dashboard of every tracked city.
    Dashboard,
}

#[derive(Debug, Subcommand)]
pub enum CitiesAction {
    /// List tracked cities.
    List,

    /// Track a new city.
    Add { name: String },

    /// Stop tracking a city, by id.
    Remove { id: String },

    /// Change a tracked city's name, by id.
    Rename { id: String, name: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Cities { action } => cities(action),
            Command::Show { city } => show(&city).await,
            Command::Dashboard => interactive::run(Config::load()?).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("WeatherAPI.com key:")
        .without_confirmation()
        .with_help_message("Get a free key at https://www.weatherapi.com/")
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn cities(action: CitiesAction) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut store = CityListStore::load(config.storage()?);

    match action {
        CitiesAction::List => println!("{}", render::city_list(store.cities())),
        CitiesAction::Add { name } => {
            let (_, note) = store.add(&name);
            println!("{}", render::notification(&note));
        }
        CitiesAction::Remove { id } => match store.remove(&id) {
            Some((_, note)) => println!("{}", render::notification(&note)),
            None => println!("No city with id {id}"),
        },
        CitiesAction::Rename { id, name } => match store.rename(&id, &name) {
            Some(note) => println!("{}", render::notification(&note)),
            None => println!("No city with id {id}"),
        },
    }

    Ok(())
}

/// Fetch one city with automatic retries and print the settled result.
async fn show(city: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let (mut fetcher, mut rx) =
        WeatherFetcher::standalone(city, provider, config.retry_policy());

    tracing::info!(city, "Fetching current weather");
    fetcher.activate();
    while !fetcher.is_settled() {
        let Some(msg) = rx.recv().await else { break };
        if !fetcher.handle(msg) {
            continue;
        }
        match fetcher.state() {
            FetchState::Failure(f) if f.retry_scheduled => eprintln!("{}; retrying…", f.message),
            _ => {}
        }
    }

    print!("{}", render::widget(1, city, fetcher.state()));
    match fetcher.state() {
        FetchState::Failure(f) => bail!("{}", f.message),
        _ => Ok(()),
    }
}
