use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A tracked city. `name` is free-form and passed to the weather service as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

impl City {
    /// Create a city with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: generate_id(), name: name.into() }
    }
}

/// Millisecond timestamp plus a process-wide sequence number.
///
/// The sequence alone guarantees uniqueness within a process; the timestamp
/// keeps ids from separate runs apart.
pub fn generate_id() -> String {
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", Utc::now().timestamp_millis())
}

/// Current conditions for one city, as last fetched. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub region: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition_text: String,
    /// Icon URL as returned by the service (usually protocol-relative).
    pub condition_icon: String,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub precip_mm: f64,
}

impl WeatherSnapshot {
    pub fn rounded_temperature(&self) -> i64 {
        self.temperature_c.round() as i64
    }

    pub fn rounded_feels_like(&self) -> i64 {
        self.feels_like_c.round() as i64
    }

    /// "Name, Region, Country", skipping empty parts.
    pub fn location_label(&self) -> String {
        [&self.location_name, &self.region, &self.country]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
