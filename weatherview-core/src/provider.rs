use crate::{
    Config,
    error::FetchError,
    model::{Coordinates, WeatherQuery, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// A source of current conditions.
///
/// Implementations issue exactly one request per call: no retries, no caching,
/// no sharing of in-flight requests.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError>;

    async fn fetch_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, FetchError> {
        let query = WeatherQuery::Coordinates(Coordinates::new(latitude, longitude));
        self.get_weather(&query).await
    }

    async fn fetch_by_city(&self, name: &str) -> Result<WeatherSnapshot, FetchError> {
        self.get_weather(&WeatherQuery::City(name.to_owned())).await
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    let provider = OpenWeatherProvider::new(config.resolved_endpoint(), api_key.to_owned())?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn provider_from_config_rejects_bad_endpoint() {
        let cfg = Config {
            endpoint: Some("not a url".into()),
            api_key: Some("KEY".into()),
            ..Config::default()
        };
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid weather endpoint"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            ..Config::default()
        };
        assert!(provider_from_config(&cfg).is_ok());
    }
}
