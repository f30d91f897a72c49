//! Google Places Client (search oracle)
//!
//! Text Search backs the fusion engine's place lookup. The same client also
//! forwards Autocomplete and Place Details calls for the browser, returning
//! the upstream body and status as-is.
//!
//! # API Reference
//! - Text Search: https://maps.googleapis.com/maps/api/place/textsearch/json
//! - Autocomplete: https://maps.googleapis.com/maps/api/place/autocomplete/json
//! - Details: https://maps.googleapis.com/maps/api/place/details/json
//!
//! Text Search statuses: `OK` → records, `ZERO_RESULTS` → empty list, any
//! other status → `OracleError::Api`.

use crate::types::{OracleError, PlaceRecord, PlaceSearch};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Places web service base URL
const PLACES_API_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Default timeout for Places requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields requested from Place Details
const DETAILS_FIELDS: &str = "geometry,name,formatted_address,place_id";

/// Upstream response forwarded verbatim by the proxy endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
}

/// Google Places client
pub struct PlacesClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Result<Self, OracleError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| OracleError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: PLACES_API_URL.to_string(),
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Forward a Places Autocomplete request
    pub async fn autocomplete(
        &self,
        input: &str,
        session_token: Option<&str>,
    ) -> Result<ProxyResponse, OracleError> {
        let mut params = vec![("input", input), ("key", self.api_key.as_str())];
        if let Some(token) = session_token {
            params.push(("sessiontoken", token));
        }
        self.forward("autocomplete", &params).await
    }

    /// Forward a Place Details request
    pub async fn details(
        &self,
        place_id: &str,
        session_token: Option<&str>,
    ) -> Result<ProxyResponse, OracleError> {
        let mut params = vec![
            ("place_id", place_id),
            ("key", self.api_key.as_str()),
            ("fields", DETAILS_FIELDS),
        ];
        if let Some(token) = session_token {
            params.push(("sessiontoken", token));
        }
        self.forward("details", &params).await
    }

    async fn forward(&self, service: &str, params: &[(&str, &str)]) -> Result<ProxyResponse, OracleError> {
        let url = format!("{}/{}/json", self.base_url, service);
        debug!(service = service, "Forwarding Places request");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("Places {} request failed: {}", service, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| OracleError::Network(format!("Places {} body read failed: {}", service, e)))?;

        Ok(ProxyResponse {
            status,
            body: proxy_body(text),
        })
    }
}

#[async_trait]
impl PlaceSearch for PlacesClient {
    fn name(&self) -> &'static str {
        "GooglePlaces"
    }

    async fn search(&self, query: &str, place_type: &str) -> Result<Vec<PlaceRecord>, OracleError> {
        debug!(query = %query, place_type = %place_type, "Querying Places Text Search");

        let url = format!("{}/textsearch/json", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("type", place_type),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("Places request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(format!(
                "Places returned {}: {}",
                status, body
            )));
        }

        let parsed: TextSearchResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(format!("Failed to parse Places response: {}", e)))?;

        records_from_response(parsed)
    }
}

/// JSON body, or `{parseError: true, txt}` when upstream sent something else
fn proxy_body(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => json!({ "parseError": true, "txt": text }),
    }
}

fn records_from_response(response: TextSearchResponse) -> Result<Vec<PlaceRecord>, OracleError> {
    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().map(PlaceRecord::from).collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        other => Err(OracleError::Api(format!(
            "Places status {}: {}",
            other,
            response.error_message.unwrap_or_default()
        ))),
    }
}

// ============================================================================
// Places API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    user_ratings_total: Option<u64>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<TextSearchResult> for PlaceRecord {
    fn from(result: TextSearchResult) -> Self {
        let location = result.geometry.and_then(|g| g.location);
        PlaceRecord {
            name: result.name.unwrap_or_default(),
            formatted_address: result.formatted_address,
            lat: location.as_ref().map(|l| l.lat),
            lng: location.as_ref().map(|l| l.lng),
            user_ratings_total: result.user_ratings_total,
            place_id: result.place_id,
        }
    }
}
