//! Error types for weather fetching and city list storage.

use thiserror::Error;

/// Message shown when the weather service answers with HTTP 429.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please wait a moment and try again.";

/// Failure of a single current-conditions request.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(
        "WeatherAPI key is missing.\n\
         Hint: run `weather configure` or set WEATHERAPI_KEY."
    )]
    MissingApiKey,

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    /// Non-success status other than 429. `message` is either the service's
    /// own `error.message` or a generic text with the status code.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse weather response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether an automatic retry can possibly succeed.
    ///
    /// A missing key needs operator intervention; everything else (including
    /// unknown-location 4xx answers) is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingApiKey)
    }

    /// Generic message used when the error body carries nothing useful.
    pub fn status_message(status: u16) -> String {
        format!("Failed to fetch weather data (status {status})")
    }
}

/// Failure of the key-value store backing the city list.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine platform data directory")]
    NoDataDir,
}
