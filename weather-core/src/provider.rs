use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{Config, WeatherSnapshot, error::FetchError, provider::weatherapi::WeatherApiProvider};

pub mod weatherapi;

/// Source of current conditions for a free-form location query.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, query: &str) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the WeatherAPI.com provider from config.
///
/// A missing key is not an error here: every fetch reports it instead, so the
/// dashboard can still show the city list.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key(std::env::var(crate::config::API_KEY_ENV).ok());
    if api_key.is_none() {
        tracing::warn!("No WeatherAPI key configured; fetches will fail until one is set");
    }

    let provider = WeatherApiProvider::new(api_key)?.with_base_url(config.base_url());
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_from_config_without_key_reports_missing_key() {
        // The environment key would take precedence.
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }

        // Unroutable so nothing leaves the machine if the key check regressed.
        let cfg = Config { base_url: Some("http://127.0.0.1:9".to_string()), ..Config::default() };

        let provider = provider_from_config(&cfg).expect("provider builds without a key");
        let err = provider.current("Paris").await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }
}
