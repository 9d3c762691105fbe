//! Turns raw daily + 3-hourly payloads into the [`ForecastView`] rendered by
//! the dashboard.
//!
//! Calendar policy: every date and clock value (the current-conditions
//! bucket, day labels, ISO dates, hourly bucketing and time labels) is taken
//! in the location's local time, i.e. UTC shifted by the provider's
//! `city.timezone` offset. Hourly `dt_txt` values are UTC and are shifted the
//! same way before their date is compared.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::Deserialize;

use crate::{
    error::ForecastError,
    model::{
        CurrentConditions, DayPeriod, DaySummary, ForecastView, HourEntry, RawCity,
        RawCurrentResponse, RawDailyEntry, RawDailyResponse, RawHourlyEntry, RawHourlyResponse,
        RawWeather,
    },
    units::{TemperatureUnit, format_humidity, format_wind_speed},
};

/// Upper bound on the number of day summaries produced.
pub const MAX_FORECAST_DAYS: usize = 16;

const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize the daily and 3-hourly provider bodies fetched in one cycle.
pub fn normalize_forecast(
    daily: &serde_json::Value,
    hourly: &serde_json::Value,
    unit: TemperatureUnit,
    now: DateTime<Utc>,
) -> Result<ForecastView, ForecastError> {
    let daily = RawDailyResponse::deserialize(daily)
        .map_err(|e| ForecastError::malformed(format!("daily payload: {e}")))?;
    let hourly = RawHourlyResponse::deserialize(hourly)
        .map_err(|e| ForecastError::malformed(format!("hourly payload: {e}")))?;

    build_forecast(&daily, &hourly.list, unit, now)
}

/// Typed counterpart of [`normalize_forecast`].
pub fn build_forecast(
    daily: &RawDailyResponse,
    hourly: &[RawHourlyEntry],
    unit: TemperatureUnit,
    now: DateTime<Utc>,
) -> Result<ForecastView, ForecastError> {
    let offset = local_offset(&daily.city)?;

    let today = daily
        .list
        .first()
        .ok_or_else(|| ForecastError::malformed("daily list is empty"))?;

    let local_hour = now.with_timezone(&offset).hour();
    let current = current_conditions(&daily.city, today, unit, local_hour)?;

    let slots = hourly
        .iter()
        .map(|entry| HourSlot::parse(entry, &offset))
        .collect::<Result<Vec<_>, _>>()?;

    let days = daily
        .list
        .iter()
        .take(MAX_FORECAST_DAYS)
        .map(|entry| day_summary(&daily.city, entry, &slots, unit, &offset))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        city = %daily.city.name,
        days = days.len(),
        hourly_slots = slots.len(),
        "Normalized forecast"
    );

    Ok(ForecastView { current, days })
}

/// Normalize a `current` granularity body on its own.
pub fn normalize_current(
    body: &serde_json::Value,
    unit: TemperatureUnit,
) -> Result<CurrentConditions, ForecastError> {
    let parsed = RawCurrentResponse::deserialize(body)
        .map_err(|e| ForecastError::malformed(format!("current payload: {e}")))?;

    let weather = first_weather(&parsed.weather, "current weather")?;

    Ok(CurrentConditions {
        city: parsed.name.clone(),
        country: parsed.sys.country.clone().unwrap_or_default(),
        period: None,
        temperature: Some(unit.format(parsed.main.temp)),
        feels_like: Some(unit.format(parsed.main.feels_like)),
        condition: weather.description.clone(),
        wind_speed: format_wind_speed(parsed.wind.speed),
        humidity: format_humidity(parsed.main.humidity),
        icon: weather.icon.clone(),
    })
}

/// Pick today's temperature and feels-like fields for the local hour.
///
/// A bucketed field the provider left out becomes `None`; `0.0` is a reading.
pub fn current_conditions(
    city: &RawCity,
    today: &RawDailyEntry,
    unit: TemperatureUnit,
    local_hour: u32,
) -> Result<CurrentConditions, ForecastError> {
    let period = DayPeriod::from_hour(local_hour);
    let (temperature, feels_like) = match period {
        DayPeriod::Day => (Some(today.temp.day), Some(today.feels_like.day)),
        DayPeriod::Evening => (today.temp.eve, today.feels_like.eve),
        DayPeriod::Night => (today.temp.night, today.feels_like.night),
    };

    if temperature.is_none() {
        tracing::warn!(city = %city.name, ?period, "Provider omitted bucketed temperature");
    }

    let weather = first_weather(&today.weather, "today")?;

    Ok(CurrentConditions {
        city: city.name.clone(),
        country: city.country.clone(),
        period: Some(period),
        temperature: temperature.map(|t| unit.format(t)),
        feels_like: feels_like.map(|t| unit.format(t)),
        condition: weather.description.clone(),
        wind_speed: format_wind_speed(today.speed),
        humidity: format_humidity(today.humidity),
        icon: weather.icon.clone(),
    })
}

struct HourSlot<'a> {
    date: NaiveDate,
    time: String,
    entry: &'a RawHourlyEntry,
}

impl<'a> HourSlot<'a> {
    fn parse(entry: &'a RawHourlyEntry, offset: &FixedOffset) -> Result<Self, ForecastError> {
        let utc = NaiveDateTime::parse_from_str(&entry.dt_txt, DT_TXT_FORMAT).map_err(|e| {
            ForecastError::malformed(format!("hourly timestamp '{}': {e}", entry.dt_txt))
        })?;
        let local = offset.from_utc_datetime(&utc);

        Ok(Self {
            date: local.date_naive(),
            time: local.format("%H:%M").to_string(),
            entry,
        })
    }
}

fn day_summary(
    city: &RawCity,
    entry: &RawDailyEntry,
    slots: &[HourSlot<'_>],
    unit: TemperatureUnit,
    offset: &FixedOffset,
) -> Result<DaySummary, ForecastError> {
    let local = DateTime::from_timestamp(entry.dt, 0)
        .ok_or_else(|| ForecastError::malformed(format!("daily timestamp {} out of range", entry.dt)))?
        .with_timezone(offset);
    let date = local.date_naive();

    let weather = first_weather(&entry.weather, "daily entry")?;

    let hourly = slots
        .iter()
        .filter(|slot| slot.date == date)
        .map(|slot| {
            let icon = first_weather(&slot.entry.weather, "hourly entry")?;
            Ok::<_, ForecastError>(HourEntry {
                time: slot.time.clone(),
                temperature: unit.format(slot.entry.main.temp),
                icon: icon.icon.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DaySummary {
        day: local.format("%A").to_string(),
        date,
        temperature: unit.format(entry.temp.day),
        min_temp: unit.format(entry.temp.min),
        max_temp: unit.format(entry.temp.max),
        feels_like: unit.format(entry.feels_like.day),
        condition: weather.description.clone(),
        icon: weather.icon.clone(),
        city: city.name.clone(),
        unit,
        hourly,
    })
}

fn local_offset(city: &RawCity) -> Result<FixedOffset, ForecastError> {
    i32::try_from(city.timezone)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ForecastError::malformed(format!("timezone offset {} out of range", city.timezone)))
}

fn first_weather<'a>(weather: &'a [RawWeather], what: &str) -> Result<&'a RawWeather, ForecastError> {
    weather
        .first()
        .ok_or_else(|| ForecastError::malformed(format!("{what} has no weather element")))
}
