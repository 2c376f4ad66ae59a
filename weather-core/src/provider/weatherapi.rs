use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{error::FetchError, model::WeatherSnapshot};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    /// Empty or whitespace-only keys are treated as absent.
    pub fn new(api_key: Option<String>) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        Ok(Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn current_url(&self, api_key: &str, query: &str) -> String {
        format!(
            "{}/current.json?key={}&q={}",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(query),
        )
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    #[serde(default)]
    precip_mm: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: Option<String>,
}

impl From<WaResponse> for WeatherSnapshot {
    fn from(parsed: WaResponse) -> Self {
        Self {
            location_name: parsed.location.name,
            region: parsed.location.region,
            country: parsed.location.country,
            temperature_c: parsed.current.temp_c,
            feels_like_c: parsed.current.feelslike_c,
            condition_text: parsed.current.condition.text,
            condition_icon: parsed.current.condition.icon,
            humidity_pct: parsed.current.humidity,
            wind_kph: parsed.current.wind_kph,
            precip_mm: parsed.current.precip_mm,
        }
    }
}

/// Map a non-success response to a [`FetchError`].
fn classify_failure(status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited;
    }

    let message = serde_json::from_str::<WaErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FetchError::status_message(status.as_u16()));

    FetchError::Api { status: status.as_u16(), message }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, query: &str) -> Result<WeatherSnapshot, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        tracing::debug!(query, "Requesting current conditions from WeatherAPI.com");
        let res = self.http.get(self.current_url(api_key, query)).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            tracing::warn!(query, %status, "WeatherAPI request failed: {err}");
            return Err(err);
        }

        let parsed: WaResponse = serde_json::from_str(&body)?;
        Ok(parsed.into())
    }
}
