use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    error::FetchError,
    model::{WeatherQuery, WeatherSnapshot},
};

use super::WeatherProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeather "current weather" endpoint, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    endpoint: Url,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// `endpoint` is the API base path, e.g. `https://api.openweathermap.org/data/2.5/`.
    /// A missing trailing slash is added so that `weather` joins underneath it.
    pub fn new(endpoint: &str, api_key: String) -> Result<Self, FetchError> {
        let mut base = endpoint.trim().to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }

        let endpoint = Url::parse(&base).map_err(|e| FetchError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(FetchError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "URL cannot be used as a base".into(),
            });
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            endpoint,
            api_key,
            http,
        })
    }

    /// Full request URL for `query`, credential included.
    pub fn request_url(&self, query: &WeatherQuery) -> Result<Url, FetchError> {
        let mut url = self
            .endpoint
            .join("weather")
            .map_err(|e| FetchError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: e.to_string(),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            match query {
                WeatherQuery::Coordinates(c) => {
                    pairs
                        .append_pair("lat", &c.latitude.to_string())
                        .append_pair("lon", &c.longitude.to_string());
                }
                WeatherQuery::City(name) => {
                    pairs.append_pair("q", name);
                }
            }
            pairs
                .append_pair("appid", &self.api_key)
                .append_pair("units", "metric");
        }

        Ok(url)
    }

    async fn fetch_current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError> {
        let url = self.request_url(query)?;
        debug!(url = %redact_credential(&url), "requesting current weather");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                message: error_message(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(FetchError::Decode)?;
        parsed.into_snapshot()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, FetchError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.main)
            .ok_or(FetchError::MissingCondition)?;

        Ok(WeatherSnapshot {
            location_name: self.name,
            country: self.sys.country,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed_kmh: self.wind.speed,
            condition,
            observed_at: self.dt.and_then(unix_to_utc),
        })
    }
}

/// OpenWeather error bodies look like `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError> {
        self.fetch_current(query).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

fn redact_credential(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
