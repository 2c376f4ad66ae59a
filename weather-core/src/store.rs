//! The persisted, ordered list of tracked cities.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{model::City, storage::KeyValueStore};

/// Storage key holding the JSON-serialized city list.
pub const CITIES_KEY: &str = "weather-dashboard.cities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A transient, user-facing message produced by a list mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Owns the city list and writes it through to storage after every change.
pub struct CityListStore {
    cities: Vec<City>,
    storage: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for CityListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CityListStore").field("cities", &self.cities).finish_non_exhaustive()
    }
}

impl CityListStore {
    /// Read the persisted list. Missing, unreadable, or corrupt content all
    /// yield an empty list.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut cities = match storage.get(CITIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<City>>(&raw) {
                Ok(cities) => cities,
                Err(e) => {
                    tracing::warn!("Ignoring unparseable city list: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read city list, starting empty: {e}");
                Vec::new()
            }
        };

        // Ids key the widgets, so only the first entry per id survives.
        let mut seen = HashSet::new();
        cities.retain(|c: &City| {
            let first = seen.insert(c.id.clone());
            if !first {
                tracing::warn!(id = %c.id, name = %c.name, "Dropping city with duplicate id");
            }
            first
        });

        tracing::debug!(count = cities.len(), "Loaded city list");
        Self { cities, storage }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn get(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Append a city. Returns the new city when the name was accepted, along
    /// with the notification to show either way.
    pub fn add(&mut self, name: &str) -> (Option<City>, Notification) {
        let name = name.trim();
        if name.is_empty() {
            return (None, Notification::warning("Please enter a city name"));
        }

        let city = City::new(name);
        tracing::info!(id = %city.id, name = %city.name, "Adding city");
        self.cities.push(city.clone());

        let notification = self
            .persist()
            .unwrap_or_else(|| Notification::success(format!("Added {name}")));
        (Some(city), notification)
    }

    /// Remove by id. Unknown ids are a silent no-op.
    pub fn remove(&mut self, id: &str) -> Option<(City, Notification)> {
        let idx = self.cities.iter().position(|c| c.id == id)?;
        let city = self.cities.remove(idx);
        tracing::info!(id = %city.id, name = %city.name, "Removed city");

        let notification = self
            .persist()
            .unwrap_or_else(|| Notification::success(format!("Removed {}", city.name)));
        Some((city, notification))
    }

    /// Change the display/query name of an existing city.
    pub fn rename(&mut self, id: &str, name: &str) -> Option<Notification> {
        let name = name.trim();
        let city = self.cities.iter_mut().find(|c| c.id == id)?;
        if name.is_empty() {
            return Some(Notification::warning("Please enter a city name"));
        }

        let old = std::mem::replace(&mut city.name, name.to_string());
        tracing::info!(id, from = %old, to = %name, "Renamed city");

        Some(
            self.persist()
                .unwrap_or_else(|| Notification::success(format!("Renamed {old} to {name}"))),
        )
    }

    /// Overwrite storage with the full list. Returns an error notification
    /// when the write failed; the in-memory list is kept either way.
    pub fn persist(&self) -> Option<Notification> {
        let result = serde_json::to_string(&self.cities)
            .map_err(|e| e.to_string())
            .and_then(|json| self.storage.set(CITIES_KEY, &json).map_err(|e| e.to_string()));

        match result {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to save city list: {e}");
                Some(Notification::error(format!("Could not save city list: {e}")))
            }
        }
    }
}
