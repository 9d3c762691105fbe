use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{DEFAULT_API_BASE_URL, DEFAULT_PRO_BASE_URL},
    error::{ForecastError, truncate_body},
    provider::{Granularity, LocationQuery, RawPayload, clamp_day_count, http_client},
};

use super::WeatherProvider;


#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    api_base_url: String,
    pro_base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ForecastError> {
        Self::with_base_urls(api_key, DEFAULT_API_BASE_URL, DEFAULT_PRO_BASE_URL)
    }

    /// Point the client at other hosts (proxies, mock servers).
    pub fn with_base_urls(
        api_key: impl Into<String>,
        api_base_url: &str,
        pro_base_url: &str,
    ) -> Result<Self, ForecastError> {
        Ok(Self {
            api_key: api_key.into(),
            http: http_client()?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            pro_base_url: pro_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Current and 3-hourly live on the public host, hourly and daily on the pro host.
    fn endpoint(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Current => format!("{}/data/2.5/weather", self.api_base_url),
            Granularity::ThreeHourly => format!("{}/data/2.5/forecast", self.api_base_url),
            Granularity::Hourly => format!("{}/data/2.5/forecast/hourly", self.pro_base_url),
            Granularity::Daily => format!("{}/data/2.5/forecast/daily", self.pro_base_url),
        }
    }

    fn query_params(
        &self,
        location: &LocationQuery,
        granularity: Granularity,
        day_count: Option<u8>,
    ) -> Vec<(&'static str, String)> {
        let mut params = match location {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };

        if granularity == Granularity::Daily {
            params.push(("cnt", clamp_day_count(day_count).to_string()));
        }

        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));
        params
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_forecast(
        &self,
        location: &LocationQuery,
        granularity: Granularity,
        day_count: Option<u8>,
    ) -> Result<RawPayload, ForecastError> {
        let url = self.endpoint(granularity);
        let params = self.query_params(location, granularity, day_count);

        tracing::debug!(%url, %location, %granularity, "Requesting OpenWeather forecast");

        let res = self.http.get(&url).query(&params).send().await.map_err(|e| {
            ForecastError::Network(format!(
                "Failed to send request to OpenWeather ({granularity}): {e}"
            ))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::Network(format!(
                "Failed to read OpenWeather {granularity} response body: {e}"
            ))
        })?;

        if !status.is_success() {
            return Err(ForecastError::Network(format!(
                "OpenWeather {granularity} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedResponse(format!(
                "Failed to parse OpenWeather {granularity} JSON: {e}"
            ))
        })?;

        Ok(RawPayload { granularity, body })
    }
}
