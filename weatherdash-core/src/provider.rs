use crate::{Config, error::ForecastError, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openweather;

pub const DEFAULT_DAY_COUNT: u8 = 7;
pub const MAX_DAY_COUNT: u8 = 16;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Daily forecast length: 7 when unspecified, otherwise clamped to `1..=16`.
pub fn clamp_day_count(days: Option<u8>) -> u8 {
    days.unwrap_or(DEFAULT_DAY_COUNT).clamp(1, MAX_DAY_COUNT)
}

/// Where to fetch weather for. The two selectors are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coordinates { lat, lon } => write!(f, "{lat:.4}, {lon:.4}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Current,
    ThreeHourly,
    Hourly,
    Daily,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Current => "current",
            Granularity::ThreeHourly => "three_hourly",
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }

    pub const fn all() -> &'static [Granularity] {
        &[
            Granularity::Current,
            Granularity::ThreeHourly,
            Granularity::Hourly,
            Granularity::Daily,
        ]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Granularity {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "current" | "today" => Ok(Granularity::Current),
            "three_hourly" | "3h" => Ok(Granularity::ThreeHourly),
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            _ => {
                let supported: Vec<_> = Granularity::all().iter().map(Granularity::as_str).collect();
                Err(anyhow::anyhow!(
                    "Unknown granularity '{value}'. Supported: {}.",
                    supported.join(", ")
                ))
            }
        }
    }
}

/// Unparsed provider body, tagged with what was asked for.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub granularity: Granularity,
    pub body: serde_json::Value,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_forecast(
        &self,
        location: &LocationQuery,
        granularity: Granularity,
        day_count: Option<u8>,
    ) -> Result<RawPayload, ForecastError>;
}

/// HTTP client shared by the provider and geocoder constructors.
pub(crate) fn http_client() -> Result<reqwest::Client, ForecastError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ForecastError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `weatherdash configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider = OpenWeatherProvider::with_base_urls(
        api_key,
        &config.api_base_url,
        &config.pro_base_url,
    )?;

    Ok(Box::new(provider))
}
