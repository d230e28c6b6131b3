//! Error types for the fetch and location layers.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid weather endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather API returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected weather response shape: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Weather response contained no condition entry")]
    MissingCondition,
}

impl FetchError {
    /// True when the API answered but did not know the requested place.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Location service unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0:?} waiting for location")]
    TimedOut(Duration),

    #[error("Location request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected location response: {0}")]
    Decode(#[source] serde_json::Error),
}
