use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Large variant of a provider icon code, e.g. `10d`.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@4x.png")
}

// ---------------------------------------------------------------------------
// Provider payloads (metric, as returned by OpenWeather)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawWeather {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCity {
    pub name: String,
    #[serde(default)]
    pub country: String,
    /// Shift from UTC in seconds.
    pub timezone: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDailyTemperature {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeelsLike {
    pub day: f64,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

/// One day of the daily forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDailyEntry {
    pub dt: i64,
    pub temp: RawDailyTemperature,
    pub feels_like: RawFeelsLike,
    pub humidity: f64,
    /// m/s
    pub speed: f64,
    pub weather: Vec<RawWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDailyResponse {
    pub city: RawCity,
    pub list: Vec<RawDailyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHourlyMain {
    pub temp: f64,
}

/// One slot of the 3-hourly (or hourly) forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHourlyEntry {
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub dt_txt: String,
    pub main: RawHourlyMain,
    pub weather: Vec<RawWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHourlyResponse {
    pub list: Vec<RawHourlyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrentMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSys {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrentResponse {
    pub name: String,
    pub main: RawCurrentMain,
    pub weather: Vec<RawWeather>,
    pub wind: RawWind,
    #[serde(default)]
    pub sys: RawSys,
}

// ---------------------------------------------------------------------------
// Normalized view model
// ---------------------------------------------------------------------------

/// Time-of-day bucket used to pick the "current" fields of today's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Day,
    Evening,
    Night,
}

impl DayPeriod {
    /// `[6,18)` day, `[18,20)` evening, everything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=17 => DayPeriod::Day,
            18..=19 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    pub period: Option<DayPeriod>,
    /// `None` when the provider left the bucketed field out.
    pub temperature: Option<String>,
    pub feels_like: Option<String>,
    pub condition: String,
    pub wind_speed: String,
    pub humidity: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourEntry {
    /// `HH:MM`
    pub time: String,
    pub temperature: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Weekday name, e.g. `Wednesday`.
    pub day: String,
    pub date: NaiveDate,
    pub temperature: String,
    pub min_temp: String,
    pub max_temp: String,
    pub feels_like: String,
    pub condition: String,
    pub icon: String,
    pub city: String,
    pub unit: TemperatureUnit,
    pub hourly: Vec<HourEntry>,
}

impl DaySummary {
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// An empty hourly list means "unavailable" for that day, not an error.
    pub fn has_hourly(&self) -> bool {
        !self.hourly.is_empty()
    }
}

/// Everything one fetch cycle produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub current: CurrentConditions,
    pub days: Vec<DaySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_boundaries() {
        let cases = [
            (0, DayPeriod::Night),
            (5, DayPeriod::Night),
            (6, DayPeriod::Day),
            (17, DayPeriod::Day),
            (18, DayPeriod::Evening),
            (19, DayPeriod::Evening),
            (20, DayPeriod::Night),
            (23, DayPeriod::Night),
        ];

        for (hour, period) in cases {
            assert_eq!(DayPeriod::from_hour(hour), period, "hour {hour}");
        }
    }
}
