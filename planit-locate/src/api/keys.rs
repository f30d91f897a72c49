//! Browser key endpoint
//!
//! GET /api/maptiler-key

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct KeyResponse {
    pub key: String,
}

/// GET /api/maptiler-key
pub async fn maptiler_key(State(state): State<AppState>) -> ApiResult<Json<KeyResponse>> {
    let key = state
        .maptiler_api_key
        .clone()
        .ok_or(ApiError::MissingApiKey("MapTiler API key"))?;

    Ok(Json(KeyResponse { key }))
}

pub fn key_routes() -> Router<AppState> {
    Router::new().route("/api/maptiler-key", get(maptiler_key))
}
