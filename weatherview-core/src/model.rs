use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// What a single weather fetch is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinates(Coordinates),
    City(String),
}

/// Current conditions for one location at one point in time.
///
/// A snapshot is never patched: each successful fetch produces a new one that
/// replaces whatever was displayed before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    /// Shown as reported by the API, labelled km/h.
    pub wind_speed_kmh: f64,
    /// Short category label such as "Clouds"; drives icon selection.
    pub condition: String,
    pub observed_at: Option<DateTime<Utc>>,
}
