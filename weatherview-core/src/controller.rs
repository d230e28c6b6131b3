//! Drives the view state: mount-time location fetch and city search.
//!
//! Both operations take `&self` so they can be in flight at the same time.
//! Each one takes a [`Generation`] when issued; whichever was issued last wins,
//! regardless of completion order.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    Config,
    config::DEFAULT_LOCATION_TIMEOUT_SECS,
    location::{LocationResolver, resolve_with_timeout},
    model::WeatherSnapshot,
    provider::{WeatherProvider, provider_from_config},
    view::{Generation, ViewState},
};

pub const SEARCH_FAILED_MESSAGE: &str =
    "Couldn't find weather for that city. Check the name and try again.";

pub const LOCATION_FAILED_MESSAGE: &str =
    "Couldn't load weather for your location. Try searching for a city.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Blank search text; nothing was requested.
    Ignored,
    /// A new snapshot is on screen.
    Applied,
    /// The error message is on screen.
    Failed,
    /// A newer fetch was issued meanwhile; the result was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct WeatherController {
    provider: Arc<dyn WeatherProvider>,
    state: Arc<Mutex<ViewState>>,
    fallback_city: Option<String>,
    location_timeout: Duration,
}

impl WeatherController {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(ViewState::new())),
            fallback_city: None,
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider)
            .with_fallback_city(config.fallback_city().map(str::to_owned))
            .with_location_timeout(config.location_timeout()))
    }

    pub fn with_fallback_city(mut self, city: Option<String>) -> Self {
        self.fallback_city = city;
        self
    }

    pub fn with_location_timeout(mut self, limit: Duration) -> Self {
        self.location_timeout = limit;
        self
    }

    /// Copy of the current state, for rendering.
    pub fn state(&self) -> ViewState {
        self.state.lock().clone()
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        self.state.lock().set_search_text(text);
    }

    /// Resolve the current position once and show its weather.
    ///
    /// On failure, falls back to the configured default city if any, else shows
    /// [`LOCATION_FAILED_MESSAGE`].
    pub async fn mount(&self, resolver: &dyn LocationResolver) -> FetchOutcome {
        let generation = self.state.lock().issue();

        let primary = match resolve_with_timeout(resolver, self.location_timeout).await {
            Ok(position) => {
                debug!(lat = position.latitude, lon = position.longitude, "location resolved");
                self.provider
                    .fetch_by_coordinates(position.latitude, position.longitude)
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        let result = match primary {
            Ok(snapshot) => Some(snapshot),
            Err(reason) => {
                warn!(%reason, "could not load weather for current location");
                self.fallback(generation).await
            }
        };

        self.complete(generation, result, LOCATION_FAILED_MESSAGE)
    }

    async fn fallback(&self, generation: Generation) -> Option<WeatherSnapshot> {
        let city = self.fallback_city.as_deref()?;

        let current = self.state.lock().is_current(generation);
        if !current {
            return None;
        }

        info!(city, "falling back to default city");
        match self.provider.fetch_by_city(city).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(city, error = %e, "default city fetch failed");
                None
            }
        }
    }

    /// Search for the city in the current search text.
    ///
    /// Blank text is a no-op. Failures never escape: they become
    /// [`SEARCH_FAILED_MESSAGE`] in the state.
    pub async fn submit_search(&self) -> FetchOutcome {
        let (generation, city) = {
            let mut state = self.state.lock();
            let city = state.search_text().trim().to_owned();
            if city.is_empty() {
                debug!("ignoring blank search");
                return FetchOutcome::Ignored;
            }
            (state.issue(), city)
        };

        let result = match self.provider.fetch_by_city(&city).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(city = %city, error = %e, "city search failed");
                None
            }
        };

        self.complete(generation, result, SEARCH_FAILED_MESSAGE)
    }

    /// Set the search text and submit it.
    pub async fn search(&self, text: impl Into<String>) -> FetchOutcome {
        self.set_search_text(text);
        self.submit_search().await
    }

    fn complete(
        &self,
        generation: Generation,
        result: Option<WeatherSnapshot>,
        failure_message: &str,
    ) -> FetchOutcome {
        let mut state = self.state.lock();
        match result {
            Some(snapshot) => {
                let location = snapshot.location_name.clone();
                if state.apply_snapshot(generation, snapshot) {
                    info!(location = %location, "weather updated");
                    FetchOutcome::Applied
                } else {
                    FetchOutcome::Stale
                }
            }
            None if state.apply_error(generation, failure_message) => FetchOutcome::Failed,
            None => FetchOutcome::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FetchError, LocationError},
        location::FixedLocation,
        model::{Coordinates, WeatherQuery},
        view::Phase,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a canned table, counting calls.
    #[derive(Debug, Default)]
    struct StubProvider {
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn snapshot(name: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            location_name: name.into(),
            country: "XX".into(),
            temperature_c: 20.0,
            humidity_pct: 50,
            wind_speed_kmh: 5.0,
            condition: "Clear".into(),
            observed_at: None,
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match query {
                WeatherQuery::Coordinates(_) => Ok(snapshot("Here")),
                WeatherQuery::City(name) if name == "Nowhereville" => Err(FetchError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                    message: "city not found".into(),
                }),
                WeatherQuery::City(name) => Ok(snapshot(name)),
            }
        }
    }

    #[derive(Debug)]
    struct DeniedLocation;

    #[async_trait]
    impl LocationResolver for DeniedLocation {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::Unavailable("permission denied".into()))
        }
    }

    fn controller() -> (Arc<StubProvider>, WeatherController) {
        let provider = Arc::new(StubProvider::default());
        let controller = WeatherController::new(provider.clone());
        (provider, controller)
    }

    #[tokio::test]
    async fn mount_shows_local_weather() {
        let (_, controller) = controller();
        assert_eq!(controller.state().phase(), Phase::Loading);

        let outcome = controller
            .mount(&FixedLocation(Coordinates::new(1.0, 2.0)))
            .await;

        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(controller.state().phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn blank_search_is_a_no_op() {
        let (provider, controller) = controller();

        for text in ["", "   ", "\t\n"] {
            controller.set_search_text(text);
            let before = controller.state();

            assert_eq!(controller.submit_search().await, FetchOutcome::Ignored);
            assert_eq!(controller.state(), before);
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn search_text_is_trimmed() {
        let (_, controller) = controller();
        assert_eq!(controller.search("  Paris ").await, FetchOutcome::Applied);
        assert_eq!(
            controller.state().snapshot().map(|s| s.location_name.clone()),
            Some("Paris".into())
        );
    }

    #[tokio::test]
    async fn failed_search_sets_fixed_message() {
        let (_, controller) = controller();
        controller.search("Paris").await;

        assert_eq!(controller.search("Nowhereville").await, FetchOutcome::Failed);

        let state = controller.state();
        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.error(), Some(SEARCH_FAILED_MESSAGE));
        assert_eq!(state.snapshot().map(|s| s.location_name.as_str()), Some("Paris"));
    }

    #[tokio::test]
    async fn denied_location_without_fallback_shows_error() {
        let (provider, controller) = controller();

        assert_eq!(controller.mount(&DeniedLocation).await, FetchOutcome::Failed);

        let state = controller.state();
        assert_eq!(state.error(), Some(LOCATION_FAILED_MESSAGE));
        assert!(state.snapshot().is_none());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn denied_location_falls_back_to_default_city() {
        let (provider, controller) = controller();
        let controller = controller.with_fallback_city(Some("Lisbon".into()));

        assert_eq!(controller.mount(&DeniedLocation).await, FetchOutcome::Applied);

        let state = controller.state();
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.snapshot().map(|s| s.location_name.as_str()), Some("Lisbon"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn clone_on_another_task_shares_state() {
        let (_, controller) = controller();
        let background = controller.clone();

        let handle = tokio::spawn(async move {
            background
                .mount(&FixedLocation(Coordinates::new(1.0, 2.0)))
                .await
        });
        controller.set_search_text("typed meanwhile");

        assert_eq!(handle.await.unwrap(), FetchOutcome::Applied);

        let state = controller.state();
        assert_eq!(state.snapshot().map(|s| s.location_name.as_str()), Some("Here"));
        assert_eq!(state.search_text(), "typed meanwhile");
    }

    #[tokio::test]
    async fn failing_fallback_shows_location_error() {
        let (_, controller) = controller();
        let controller = controller.with_fallback_city(Some("Nowhereville".into()));

        assert_eq!(controller.mount(&DeniedLocation).await, FetchOutcome::Failed);
        assert_eq!(controller.state().error(), Some(LOCATION_FAILED_MESSAGE));
    }
}
