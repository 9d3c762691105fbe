use std::fmt::Write;

use weatherdash_core::{CurrentConditions, DaySummary, ForecastView, model::icon_url};

const UNAVAILABLE: &str = "n/a";

pub fn current(current: &CurrentConditions, favorite: bool) -> String {
    let mut out = String::new();
    let star = if favorite { " ★" } else { "" };
    let _ = writeln!(out, "{}, {}{star}", current.city, current.country);
    let _ = writeln!(
        out,
        "  {}  (feels like {})  {}",
        current.temperature.as_deref().unwrap_or(UNAVAILABLE),
        current.feels_like.as_deref().unwrap_or(UNAVAILABLE),
        current.condition,
    );
    let _ = writeln!(out, "  Wind {}  Humidity {}", current.wind_speed, current.humidity);
    let _ = writeln!(out, "  {}", icon_url(&current.icon));
    out
}

fn day_line(day: &DaySummary) -> String {
    format!(
        "{:<10} {}  {:>6}  {:>6} / {:<6} {}",
        day.day,
        &day.iso_date()[5..],
        day.temperature,
        day.min_temp,
        day.max_temp,
        day.condition,
    )
}

pub fn forecast(view: &ForecastView, favorite: bool, hourly: bool) -> String {
    let mut out = current(&view.current, favorite);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}-day forecast", view.days.len());

    for day in &view.days {
        let _ = writeln!(out, "{}", day_line(day));
        if !hourly {
            continue;
        }
        if day.has_hourly() {
            for hour in &day.hourly {
                let _ = writeln!(out, "    {}  {:>6}", hour.time, hour.temperature);
            }
        } else {
            let _ = writeln!(out, "    No hourly forecast available");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherdash_core::{HourEntry, TemperatureUnit};

    fn sample() -> ForecastView {
        let day = |date: &str, hourly: Vec<HourEntry>| DaySummary {
            day: "Wednesday".into(),
            date: date.parse().unwrap(),
            temperature: "24°C".into(),
            min_temp: "15°C".into(),
            max_temp: "27°C".into(),
            feels_like: "24°C".into(),
            condition: "sky is clear".into(),
            icon: "01d".into(),
            city: "Rabat".into(),
            unit: TemperatureUnit::Celsius,
            hourly,
        };

        ForecastView {
            current: CurrentConditions {
                city: "Rabat".into(),
                country: "MA".into(),
                period: None,
                temperature: None,
                feels_like: Some("13°C".into()),
                condition: "sky is clear".into(),
                wind_speed: "18 km/h".into(),
                humidity: "64%".into(),
                icon: "01n".into(),
            },
            days: vec![
                day(
                    "2024-05-01",
                    vec![HourEntry { time: "15:00".into(), temperature: "23°C".into(), icon: "01d".into() }],
                ),
                day("2024-05-02", Vec::new()),
            ],
        }
    }

    #[test]
    fn unavailable_temperature_is_marked() {
        let out = forecast(&sample(), false, false);
        assert!(out.contains("n/a  (feels like 13°C)"));
        assert!(!out.contains("15:00"));
    }

    #[test]
    fn hourly_rows_and_unavailable_days() {
        let out = forecast(&sample(), true, true);
        assert!(out.starts_with("Rabat, MA ★"));
        assert!(out.contains("15:00"));
        assert!(out.contains("No hourly forecast available"));
        assert!(out.contains("05-02"));
    }
}
