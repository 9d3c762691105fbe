//! Application state owned by a single coordinating container.
//!
//! Every intent that needs data issues a [`FetchRequest`] tagged with a
//! monotonically increasing [`CycleTicket`]. Requests are free to complete in
//! any order; [`Dashboard::apply`] only accepts the result of the most
//! recently issued ticket and drops the rest.

use chrono::{DateTime, Utc};

use crate::{
    Config,
    error::ForecastError,
    geocode::PlaceName,
    model::ForecastView,
    normalizer::normalize_forecast,
    provider::{Granularity, LocationQuery, WeatherProvider, clamp_day_count},
    units::TemperatureUnit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleTicket(u64);

/// What the view layer should render.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading { previous: Option<ForecastView> },
    Ready(ForecastView),
    Failed {
        error: String,
        retryable: bool,
        previous: Option<ForecastView>,
    },
}

impl ViewState {
    /// The forecast currently on screen, if any.
    pub fn forecast(&self) -> Option<&ForecastView> {
        match self {
            ViewState::Idle => None,
            ViewState::Ready(view) => Some(view),
            ViewState::Loading { previous } | ViewState::Failed { previous, .. } => previous.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }
}

/// User actions emitted by the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search(String),
    /// A map click. Only records the coordinate; see [`Intent::ConfirmPick`].
    PickLocation { lat: f64, lon: f64 },
    /// Load the picked coordinate once its name resolved.
    ConfirmPick(PlaceName),
    SetUnit(TemperatureUnit),
    ToggleUnit,
    ToggleDarkMode,
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: CycleTicket,
    pub location: LocationQuery,
    pub unit: TemperatureUnit,
    pub day_count: u8,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub search_city: Option<String>,
    pub picked: Option<(f64, f64)>,
    pub unit: TemperatureUnit,
    pub dark_mode: bool,
    /// Location of the last successful cycle; unit changes re-fetch it.
    pub last_location: Option<LocationQuery>,
    pub view: ViewState,
}

#[derive(Debug)]
pub struct Dashboard {
    state: AppState,
    default_city: String,
    day_count: u8,
    next_ticket: u64,
    in_flight: Option<(CycleTicket, LocationQuery)>,
}

impl Dashboard {
    pub fn new(config: &Config) -> Self {
        Self {
            state: AppState {
                search_city: None,
                picked: None,
                unit: config.unit,
                dark_mode: false,
                last_location: None,
                view: ViewState::Idle,
            },
            default_city: config.default_city.clone(),
            day_count: config.day_count(),
            next_ticket: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// First cycle on startup, for the configured default city.
    pub fn initial_load(&mut self) -> FetchRequest {
        let location = self.current_location();
        self.issue(location)
    }

    /// Apply an intent; returns the fetch to run, if one is needed.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Option<FetchRequest>, ForecastError> {
        let request = match intent {
            Intent::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    tracing::debug!("Ignoring empty search");
                    return Ok(None);
                }
                self.state.search_city = Some(query.to_string());
                self.state.picked = None;
                Some(self.issue(LocationQuery::City(query.to_string())))
            }
            Intent::PickLocation { lat, lon } => {
                self.state.picked = Some((lat, lon));
                None
            }
            Intent::ConfirmPick(name) => {
                let Some((lat, lon)) = self.state.picked else {
                    tracing::debug!("Nothing picked to confirm");
                    return Ok(None);
                };
                if !name.is_resolved() {
                    return Err(ForecastError::ResolutionFailed { lat, lon });
                }
                tracing::info!(%name, lat, lon, "Confirmed map location");
                Some(self.issue(LocationQuery::Coordinates { lat, lon }))
            }
            Intent::SetUnit(unit) => {
                if unit == self.state.unit {
                    None
                } else {
                    self.state.unit = unit;
                    Some(self.refetch())
                }
            }
            Intent::ToggleUnit => {
                self.state.unit = self.state.unit.toggled();
                Some(self.refetch())
            }
            Intent::ToggleDarkMode => {
                self.state.dark_mode = !self.state.dark_mode;
                None
            }
            Intent::Refresh => Some(self.refetch()),
        };

        Ok(request)
    }

    /// Deliver the outcome of a cycle. Returns `false` if it was superseded.
    pub fn apply(
        &mut self,
        ticket: CycleTicket,
        result: Result<ForecastView, ForecastError>,
    ) -> bool {
        let location = match self.in_flight.take() {
            Some((latest, location)) if latest == ticket => location,
            other => {
                tracing::debug!(?ticket, latest = ?other.as_ref().map(|(t, _)| *t), "Discarding stale fetch cycle");
                self.in_flight = other;
                return false;
            }
        };

        let previous = self.state.view.forecast().cloned();
        self.state.view = match result {
            Ok(view) => {
                tracing::info!(%location, days = view.days.len(), "Fetch cycle complete");
                self.state.last_location = Some(location);
                self.state.search_city = None;
                self.state.picked = None;
                ViewState::Ready(view)
            }
            Err(e) => {
                tracing::warn!(%location, "Fetch cycle failed: {e}");
                ViewState::Failed {
                    error: e.to_string(),
                    retryable: e.is_retryable(),
                    previous,
                }
            }
        };

        true
    }

    /// Run a cycle to completion against `provider` and apply it.
    pub async fn run_cycle(&mut self, provider: &dyn WeatherProvider, request: FetchRequest) -> bool {
        let result = load_forecast(provider, &request, Utc::now()).await;
        self.apply(request.ticket, result)
    }

    /// Pending search, then the last location, then the configured default.
    /// An unconfirmed map pick is never fetched.
    fn current_location(&self) -> LocationQuery {
        if let Some(city) = &self.state.search_city {
            return LocationQuery::City(city.clone());
        }
        self.state
            .last_location
            .clone()
            .unwrap_or_else(|| LocationQuery::City(self.default_city.clone()))
    }

    fn refetch(&mut self) -> FetchRequest {
        let location = self.current_location();
        self.issue(location)
    }

    fn issue(&mut self, location: LocationQuery) -> FetchRequest {
        self.next_ticket += 1;
        let ticket = CycleTicket(self.next_ticket);

        let previous = self.state.view.forecast().cloned();
        self.state.view = ViewState::Loading { previous };
        self.in_flight = Some((ticket, location.clone()));

        FetchRequest {
            ticket,
            location,
            unit: self.state.unit,
            day_count: self.day_count,
        }
    }
}

/// Fetch daily and 3-hourly data concurrently and normalize them together.
pub async fn load_forecast(
    provider: &dyn WeatherProvider,
    request: &FetchRequest,
    now: DateTime<Utc>,
) -> Result<ForecastView, ForecastError> {
    let day_count = Some(clamp_day_count(Some(request.day_count)));
    let (daily, hourly) = tokio::try_join!(
        provider.fetch_forecast(&request.location, Granularity::Daily, day_count),
        provider.fetch_forecast(&request.location, Granularity::ThreeHourly, None),
    )?;

    normalize_forecast(&daily.body, &hourly.body, request.unit, now)
}
