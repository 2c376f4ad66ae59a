//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The persisted list of tracked cities
//! - Per-city weather widgets with bounded automatic retry
//! - The WeatherAPI.com provider behind the [`WeatherProvider`] trait
//!
//! It is used by `weather-cli`, but can also be reused by other frontends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod provider;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{FetchError, StorageError};
pub use fetcher::{FetchFailure, FetchState, RetryPolicy, WeatherFetcher};
pub use model::{City, WeatherSnapshot};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{CityListStore, Notification, NotificationLevel};
