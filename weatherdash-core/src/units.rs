use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Display unit for temperatures. Provider values are always Celsius; the unit
/// only matters when a value is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    /// Convert a Celsius value into this unit, unrounded.
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Rounded whole degrees in this unit.
    pub fn degrees(&self, celsius: f64) -> i64 {
        // `as` maps -0.0 to 0 so we never print "-0".
        self.convert(celsius).round() as i64
    }

    /// Format a Celsius value, e.g. `21°C` or `70°F`.
    pub fn format(&self, celsius: f64) -> String {
        format!("{}{}", self.degrees(celsius), self.symbol())
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "c" | "celsius" | "metric" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: c, f."
            )),
        }
    }
}

/// Wind speed from a metric payload (m/s) rendered in km/h.
pub fn format_wind_speed(meters_per_second: f64) -> String {
    format!("{} km/h", (meters_per_second * 3.6).round() as i64)
}

pub fn format_humidity(percent: f64) -> String {
    format!("{}%", percent.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_matches_rounded_formula() {
        for tenths in -500..=500 {
            let v = f64::from(tenths) / 10.0;
            let expected = (v * 9.0 / 5.0 + 32.0).round() as i64;
            assert_eq!(TemperatureUnit::Fahrenheit.degrees(v), expected, "value {v}");
        }
    }

    #[test]
    fn converting_back_from_rounded_fahrenheit_stays_within_one_degree() {
        for tenths in -400..=450 {
            let v = f64::from(tenths) / 10.0;
            let f = TemperatureUnit::Fahrenheit.degrees(v) as f64;
            let back = ((f - 32.0) * 5.0 / 9.0).round();
            let c = TemperatureUnit::Celsius.degrees(v) as f64;
            assert!((back - c).abs() <= 1.0, "value {v}: {back} vs {c}");
        }
    }

    #[test]
    fn format_uses_unit_symbol() {
        assert_eq!(TemperatureUnit::Celsius.format(21.4), "21°C");
        assert_eq!(TemperatureUnit::Fahrenheit.format(21.4), "71°F");
        assert_eq!(TemperatureUnit::Fahrenheit.format(-40.0), "-40°F");
    }

    #[test]
    fn negative_zero_is_printed_as_zero() {
        assert_eq!(TemperatureUnit::Celsius.format(-0.3), "0°C");
    }

    #[test]
    fn no_rounding_before_conversion() {
        // 0.3°C → 32.54°F → 33, rounding first would give 32.
        assert_eq!(TemperatureUnit::Fahrenheit.format(0.3), "33°F");
    }

    #[test]
    fn parse_unit_aliases() {
        assert_eq!(TemperatureUnit::try_from("C").unwrap(), TemperatureUnit::Celsius);
        assert_eq!(TemperatureUnit::try_from("fahrenheit").unwrap(), TemperatureUnit::Fahrenheit);
        let err = TemperatureUnit::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit"));
    }

    #[test]
    fn toggled_flips_unit() {
        assert_eq!(TemperatureUnit::Celsius.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::Fahrenheit.toggled(), TemperatureUnit::Celsius);
    }

    #[test]
    fn wind_and_humidity_formatting() {
        assert_eq!(format_wind_speed(5.0), "18 km/h");
        assert_eq!(format_humidity(64.6), "65%");
    }
}
