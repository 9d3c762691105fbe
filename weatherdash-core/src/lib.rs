//! Core library for the `weatherdash` weather dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The OpenWeather forecast client and geocoder
//! - The favorites store
//! - Forecast normalization into a render-ready view model
//! - Dashboard state driven by user intents
//!
//! It is used by `weatherdash-cli`, but can also back other front-ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod favorites;
pub mod geocode;
pub mod model;
pub mod normalizer;
pub mod provider;
pub mod units;

pub use config::Config;
pub use dashboard::{AppState, CycleTicket, Dashboard, FetchRequest, Intent, ViewState, load_forecast};
pub use error::ForecastError;
pub use favorites::FavoritesStore;
pub use geocode::{OpenWeatherGeocoder, PlaceCandidate, PlaceName, PlaceNameResolver, UNRESOLVED_PLACE_NAME};
pub use model::{CurrentConditions, DayPeriod, DaySummary, ForecastView, HourEntry};
pub use normalizer::{normalize_current, normalize_forecast};
pub use provider::{Granularity, LocationQuery, RawPayload, WeatherProvider};
pub use units::TemperatureUnit;
