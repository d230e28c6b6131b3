//! Where the viewer is. Mount asks a [`LocationResolver`] exactly once.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{error::LocationError, model::Coordinates};

pub const DEFAULT_IP_LOCATION_URL: &str = "https://ipapi.co/json/";

#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates known up front (CLI flags, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationResolver for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpLocationResolver {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IpLocationResolver {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_IP_LOCATION_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            http: Client::new(),
        }
    }
}

impl Default for IpLocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationResolver for IpLocationResolver {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        debug!(url = %self.url, "resolving location from IP");

        let res = self.http.get(&self.url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned status {status}"
            )));
        }

        let body = res.text().await?;
        let parsed: IpApiResponse = serde_json::from_str(&body).map_err(LocationError::Decode)?;

        match (parsed.latitude, parsed.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates::new(latitude, longitude)),
            _ => Err(LocationError::Unavailable(
                "lookup response had no coordinates".into(),
            )),
        }
    }
}

/// Ask `resolver` for a position, giving up after `limit`.
pub async fn resolve_with_timeout(
    resolver: &dyn LocationResolver,
    limit: Duration,
) -> Result<Coordinates, LocationError> {
    tokio::time::timeout(limit, resolver.current_position())
        .await
        .map_err(|_| LocationError::TimedOut(limit))?
}
