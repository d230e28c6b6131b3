//! Presentation state: what the screen shows and how it got there.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::{
    icon::{ConditionStyle, condition_style},
    model::WeatherSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Ready,
    Error,
}

/// Token handed out when a fetch is issued. Only the most recently issued
/// token may write its result into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    snapshot: Option<WeatherSnapshot>,
    search_text: String,
    error: Option<String>,
    latest: u64,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.error.is_some() {
            Phase::Error
        } else if self.snapshot.is_some() {
            Phase::Ready
        } else {
            Phase::Loading
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Start a new fetch. Any fetch issued earlier becomes stale.
    pub fn issue(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.latest
    }

    /// Replace the snapshot and clear any error. Returns false if `generation` is stale.
    pub fn apply_snapshot(&mut self, generation: Generation, snapshot: WeatherSnapshot) -> bool {
        if !self.is_current(generation) {
            debug!(?generation, latest = self.latest, "discarding stale snapshot");
            return false;
        }
        self.snapshot = Some(snapshot);
        self.error = None;
        true
    }

    /// Record a failure. The current snapshot, if any, stays in place.
    pub fn apply_error(&mut self, generation: Generation, message: &str) -> bool {
        if !self.is_current(generation) {
            debug!(?generation, latest = self.latest, "discarding stale failure");
            return false;
        }
        self.error = Some(message.to_owned());
        true
    }
}

/// Snapshot values formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFields {
    pub name: String,
    pub country: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind_speed: String,
    pub style: ConditionStyle,
    pub updated: Option<String>,
}

impl From<&WeatherSnapshot> for DisplayFields {
    fn from(s: &WeatherSnapshot) -> Self {
        Self {
            name: s.location_name.clone(),
            country: s.country.clone(),
            // Ties round away from zero.
            temperature: format!("{:.0}°C", s.temperature_c.round()),
            condition: s.condition.clone(),
            humidity: format!("{}%", s.humidity_pct),
            wind_speed: format!("{}km/h", s.wind_speed_kmh),
            style: condition_style(&s.condition),
            updated: s
                .observed_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

pub const LOADING_TEXT: &str = "Loading";

/// Text screen for a [`ViewState`].
#[derive(Debug, Clone, Copy)]
pub struct Screen<'a>(pub &'a ViewState);

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        match state.phase() {
            Phase::Loading => writeln!(f, "⟳ {LOADING_TEXT}"),
            Phase::Error => {
                writeln!(f, "⚠ {}", state.error().unwrap_or_default())?;
                match state.snapshot() {
                    Some(snapshot) => {
                        writeln!(f)?;
                        write_weather(f, &DisplayFields::from(snapshot))
                    }
                    None => Ok(()),
                }
            }
            Phase::Ready => match state.snapshot() {
                Some(snapshot) => write_weather(f, &DisplayFields::from(snapshot)),
                None => Ok(()),
            },
        }
    }
}

pub fn render(state: &ViewState) -> String {
    Screen(state).to_string()
}

fn write_weather(f: &mut fmt::Formatter<'_>, fields: &DisplayFields) -> fmt::Result {
    writeln!(f, "{}, {}", fields.name, fields.country)?;
    writeln!(
        f,
        "{} {}  ({})",
        fields.style.icon.glyph(),
        fields.condition,
        fields.style.color
    )?;
    writeln!(f, "{}", fields.temperature)?;
    writeln!(f, "Humidity    {}", fields.humidity)?;
    writeln!(f, "Wind Speed  {}", fields.wind_speed)?;
    if let Some(updated) = &fields.updated {
        writeln!(f, "Updated {updated}")?;
    }
    Ok(())
}
