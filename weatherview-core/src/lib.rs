//! Core library for the `weatherview` current-conditions viewer.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather fetcher and location resolvers
//! - The presentation state machine and its text rendering
//!
//! It is used by `weatherview-cli`, but any front end can drive a
//! [`WeatherController`] and render its [`ViewState`].

pub mod config;
pub mod controller;
pub mod error;
pub mod icon;
pub mod location;
pub mod model;
pub mod provider;
pub mod view;

pub use config::Config;
pub use controller::{
    FetchOutcome, LOCATION_FAILED_MESSAGE, SEARCH_FAILED_MESSAGE, WeatherController,
};
pub use error::{FetchError, LocationError};
pub use icon::{ConditionStyle, Icon, condition_style};
pub use location::{FixedLocation, IpLocationResolver, LocationResolver};
pub use model::{Coordinates, WeatherQuery, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use view::{DisplayFields, Phase, Screen, ViewState, render};
