//! Reverse and forward geocoding through the OpenWeather geo API.
//!
//! Reverse lookups never fail outright: any problem collapses into the
//! [`UNRESOLVED_PLACE_NAME`] sentinel, which callers must check before
//! enabling anything that depends on the name.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{
    config::DEFAULT_API_BASE_URL,
    error::{ForecastError, truncate_body},
    provider::http_client,
};

pub const UNRESOLVED_PLACE_NAME: &str = "Unable to fetch name";

const SEARCH_LIMIT: u8 = 5;

/// Result of a reverse lookup: a real name or the unresolved sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName(String);

impl PlaceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unresolved() -> Self {
        Self(UNRESOLVED_PLACE_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_resolved(&self) -> bool {
        self.0 != UNRESOLVED_PLACE_NAME
    }
}

impl std::fmt::Display for PlaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl PlaceCandidate {
    /// e.g. `Springfield, Illinois, US`
    pub fn label(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            parts.push(state);
        }
        if !self.country.is_empty() {
            parts.push(&self.country);
        }
        parts.join(", ")
    }
}

#[async_trait]
pub trait PlaceNameResolver: Send + Sync + Debug {
    /// Name of the place at a coordinate, or the unresolved sentinel.
    async fn resolve(&self, lat: f64, lon: f64) -> PlaceName;

    /// Candidate places for free text. Blank queries are rejected without a request.
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ForecastError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ForecastError> {
        Self::with_base_url(api_key, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self, ForecastError> {
        Ok(Self {
            api_key: api_key.into(),
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_candidates(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<PlaceCandidate>, ForecastError> {
        let url = format!("{}/geo/1.0/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ForecastError::Network(format!("Failed to send geocoding request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ForecastError::Network(format!("Failed to read geocoding response: {e}")))?;

        if !status.is_success() {
            return Err(ForecastError::Network(format!(
                "Geocoding {endpoint} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedResponse(format!("Failed to parse geocoding {endpoint} JSON: {e}"))
        })
    }
}

#[async_trait]
impl PlaceNameResolver for OpenWeatherGeocoder {
    async fn resolve(&self, lat: f64, lon: f64) -> PlaceName {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("limit", "1".to_string()),
        ];

        match self.get_candidates("reverse", &params).await {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(place) => {
                    tracing::info!("Reverse geocoded to: {}", place.name);
                    PlaceName::new(place.name)
                }
                None => {
                    tracing::warn!(lat, lon, "Reverse geocode returned no places");
                    PlaceName::unresolved()
                }
            },
            Err(e) => {
                tracing::warn!(lat, lon, "Reverse geocode failed: {e}");
                PlaceName::unresolved()
            }
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ForecastError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForecastError::UserInputRejected);
        }

        let params = [("q", query.to_string()), ("limit", SEARCH_LIMIT.to_string())];
        let candidates = self.get_candidates("direct", &params).await?;

        tracing::debug!(query, found = candidates.len(), "Place search");
        Ok(candidates)
    }
}

/// Local autocomplete: candidates containing `input`, case-insensitively.
pub fn suggest<'a>(input: &str, candidates: &'a [String]) -> Vec<&'a str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    candidates
        .iter()
        .filter(|c| c.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer) -> OpenWeatherGeocoder {
        OpenWeatherGeocoder::with_base_url("test_key", &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn resolve_returns_first_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .and(query_param("lat", "34.02"))
            .and(query_param("lon", "-6.84"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Rabat", "country": "MA", "lat": 34.02, "lon": -6.84 }
            ])))
            .mount(&server)
            .await;

        let name = geocoder(&server).resolve(34.02, -6.84).await;
        assert_eq!(name.as_str(), "Rabat");
        assert!(name.is_resolved());
    }

    #[tokio::test]
    async fn resolve_with_no_candidates_is_sentinel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let name = geocoder(&server).resolve(0.0, -160.0).await;
        assert_eq!(name.as_str(), "Unable to fetch name");
        assert!(!name.is_resolved());
    }

    #[tokio::test]
    async fn resolve_on_server_error_is_sentinel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let name = geocoder(&server).resolve(1.0, 1.0).await;
        assert_eq!(name, PlaceName::unresolved());
    }

    #[tokio::test]
    async fn resolve_on_malformed_body_is_sentinel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "x" })))
            .mount(&server)
            .await;

        assert!(!geocoder(&server).resolve(1.0, 1.0).await.is_resolved());
    }

    #[tokio::test]
    async fn search_returns_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "springfield"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Springfield", "country": "US", "state": "Illinois", "lat": 39.8, "lon": -89.6 },
                { "name": "Springfield", "country": "US", "state": "Missouri", "lat": 37.2, "lon": -93.3 }
            ])))
            .mount(&server)
            .await;

        let found = geocoder(&server).search("  springfield ").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].label(), "Springfield, Illinois, US");
    }

    #[tokio::test]
    async fn blank_search_is_rejected_without_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = geocoder(&server).search("   ").await.unwrap_err();
        assert!(matches!(err, ForecastError::UserInputRejected));
    }

    #[test]
    fn suggest_filters_case_insensitively() {
        let cities = vec!["Paris".to_string(), "Tokyo".to_string(), "Parma".to_string()];
        assert_eq!(suggest("par", &cities), ["Paris", "Parma"]);
        assert_eq!(suggest("KYO", &cities), ["Tokyo"]);
        assert!(suggest("", &cities).is_empty());
        assert!(suggest("zzz", &cities).is_empty());
    }

    #[test]
    fn label_skips_missing_parts() {
        let place = PlaceCandidate {
            name: "Atlantis".into(),
            country: String::new(),
            state: None,
            lat: 0.0,
            lon: 0.0,
        };
        assert_eq!(place.label(), "Atlantis");
    }
}
