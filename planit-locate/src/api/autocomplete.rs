//! Places autocomplete proxy
//!
//! GET /api/autocomplete, GET /api/autocomplete/details
//!
//! Keeps the Places key on the server. Upstream bodies and status codes are
//! passed through unchanged.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    oracles::{PlacesClient, ProxyResponse},
    AppState,
};

/// GET /api/autocomplete query
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub input: Option<String>,
    pub sessiontoken: Option<String>,
}

/// GET /api/autocomplete/details query
#[derive(Debug, Deserialize)]
pub struct DetailsParams {
    pub place_id: Option<String>,
    pub sessiontoken: Option<String>,
}

/// GET /api/autocomplete
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> ApiResult<Response> {
    let input = required(params.input, "input")?;
    let places = places_client(&state)?;

    let upstream = places
        .autocomplete(&input, params.sessiontoken.as_deref())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(forward(upstream))
}

/// GET /api/autocomplete/details
pub async fn details(
    State(state): State<AppState>,
    Query(params): Query<DetailsParams>,
) -> ApiResult<Response> {
    let place_id = required(params.place_id, "place_id")?;
    let places = places_client(&state)?;

    let upstream = places
        .details(&place_id, params.sessiontoken.as_deref())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(forward(upstream))
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} required", name)))
}

fn places_client(state: &AppState) -> ApiResult<&PlacesClient> {
    state
        .places
        .as_deref()
        .ok_or(ApiError::MissingApiKey("Places API key"))
}

fn forward(upstream: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

/// Build autocomplete proxy routes
pub fn autocomplete_routes() -> Router<AppState> {
    Router::new()
        .route("/api/autocomplete", get(autocomplete))
        .route("/api/autocomplete/details", get(details))
}
