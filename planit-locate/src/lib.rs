//! planit-locate library interface
//!
//! Photo → location identification service. Exposes the fusion engine,
//! the oracle clients and the HTTP router for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod fusion;
pub mod oracles;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::fusion::LocationResolver;
use crate::oracles::PlacesClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Candidate fusion engine
    pub resolver: Arc<LocationResolver>,
    /// Places client for the browser proxy endpoints (None without a key)
    pub places: Option<Arc<PlacesClient>>,
    /// MapTiler key handed to the browser
    pub maptiler_api_key: Option<String>,
    /// Request body ceiling
    pub max_body_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last surfaced request failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(resolver: LocationResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            places: None,
            maptiler_api_key: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_places(mut self, places: PlacesClient) -> Self {
        self.places = Some(Arc::new(places));
        self
    }

    pub fn with_maptiler_key(mut self, key: Option<String>) -> Self {
        self.maptiler_api_key = key;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Remember a failure for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::root_routes())
        .merge(api::health_routes())
        .merge(api::location_routes())
        .merge(api::autocomplete_routes())
        .merge(api::key_routes())
        .fallback(error::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
