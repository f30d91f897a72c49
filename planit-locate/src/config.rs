//! Configuration resolution for planit-locate
//!
//! Builds the explicit `FusionConfig` handed to the fusion engine and the
//! surrounding `ServiceConfig`. Nothing downstream reads the environment.
//!
//! **Priority:** CLI → ENV → TOML → built-in defaults
//!
//! Credential chains:
//! - Gemini: `GOOGLE_GEMINI_API_KEY` → `GOOGLE_SERVER_API_KEY` → TOML
//!   `gemini_api_key` → TOML `server_api_key`
//! - Places: `GOOGLE_PLACES_API_KEY` → `GOOGLE_SERVER_API_KEY` → TOML
//!   `places_api_key` → TOML `server_api_key` → the Gemini key
//! - MapTiler: `MAPTILER_API_KEY` → TOML `maptiler_api_key`

use crate::fusion::ScoringConfig;
use planit_common::config::{
    resolve_credential, CredentialSource, LocationSection, ResolvedCredential, TomlConfig,
};
use tracing::{info, warn};

/// Default recognition model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default place-type fan-out order
pub const DEFAULT_PLACE_TYPES: &[&str] = &["tourist_attraction", "point_of_interest", "establishment"];

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default request body ceiling (base64 photos are large)
pub const DEFAULT_MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Fusion engine configuration
#[derive(Clone)]
pub struct FusionConfig {
    /// Gemini API key; without it every location request fails
    pub recognition_api_key: Option<String>,
    /// Places API key; without it search is skipped
    pub search_api_key: Option<String>,
    /// Gemini model identifier
    pub recognition_model: String,
    /// Ordered place-type hints for the search fan-out
    pub place_types: Vec<String>,
    /// Tokens appended to every search query
    pub query_bias_terms: Vec<String>,
    /// Confidence bounds
    pub scoring: ScoringConfig,
    /// Largest decoded or downloaded image accepted
    pub max_image_bytes: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            recognition_api_key: None,
            search_api_key: None,
            recognition_model: DEFAULT_MODEL.to_string(),
            place_types: DEFAULT_PLACE_TYPES.iter().map(|t| t.to_string()).collect(),
            query_bias_terms: Vec::new(),
            scoring: ScoringConfig::default(),
            max_image_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl std::fmt::Debug for FusionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionConfig")
            .field("recognition_api_key", &self.recognition_api_key.as_ref().map(|_| "<redacted>"))
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "<redacted>"))
            .field("recognition_model", &self.recognition_model)
            .field("place_types", &self.place_types)
            .field("query_bias_terms", &self.query_bias_terms)
            .field("scoring", &self.scoring)
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}

impl FusionConfig {
    /// Resolve credentials (ENV → TOML) and apply `[location]` overrides
    pub fn from_toml(toml: &TomlConfig) -> Self {
        let recognition = resolve_credential(
            "Gemini API key",
            &["GOOGLE_GEMINI_API_KEY", "GOOGLE_SERVER_API_KEY"],
            &[
                ("gemini_api_key", toml.gemini_api_key.as_deref()),
                ("server_api_key", toml.server_api_key.as_deref()),
            ],
        )
        .map(|c| c.value);

        if recognition.is_none() {
            warn!("Gemini API key not configured; location requests will fail until one is set");
        }

        let search = resolve_credential(
            "Places API key",
            &["GOOGLE_PLACES_API_KEY", "GOOGLE_SERVER_API_KEY"],
            &[
                ("places_api_key", toml.places_api_key.as_deref()),
                ("server_api_key", toml.server_api_key.as_deref()),
            ],
        )
        .or_else(|| {
            recognition.clone().map(|value| ResolvedCredential {
                value,
                source: CredentialSource::Fallback("Gemini API key".to_string()),
            })
        })
        .map(|c| {
            if let CredentialSource::Fallback(_) = c.source {
                info!("Places API key loaded from {}", c.source);
            }
            c.value
        });

        if search.is_none() {
            warn!("Places API key not configured; place search disabled");
        }

        Self {
            recognition_api_key: recognition,
            search_api_key: search,
            ..Self::default()
        }
        .with_overrides(&toml.location)
    }

    /// Apply `[location]` overrides; invalid values keep defaults with a warning
    pub fn with_overrides(mut self, section: &LocationSection) -> Self {
        if let Some(model) = section.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            self.recognition_model = model.to_string();
        }

        if let Some(types) = &section.place_types {
            let types: Vec<String> = types
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if types.is_empty() {
                warn!("Empty location.place_types, using defaults");
            } else {
                self.place_types = types;
            }
        }

        if let Some(terms) = &section.query_bias_terms {
            self.query_bias_terms = terms.clone();
        }

        let scoring = &mut self.scoring;
        let floor = section
            .recognition_confidence_floor
            .unwrap_or(scoring.recognition_confidence_floor);
        let ceiling = section
            .recognition_confidence_ceiling
            .unwrap_or(scoring.recognition_confidence_ceiling);
        if is_unit(floor) && is_unit(ceiling) && floor <= ceiling {
            scoring.recognition_confidence_floor = floor;
            scoring.recognition_confidence_ceiling = ceiling;
        } else {
            warn!(
                floor = floor,
                ceiling = ceiling,
                "Invalid recognition confidence bounds, using defaults"
            );
        }

        if let Some(ceiling) = section.search_confidence_ceiling {
            if is_unit(ceiling) {
                scoring.search_confidence_ceiling = ceiling;
            } else {
                warn!(ceiling = ceiling, "Invalid search confidence ceiling, using default");
            }
        }

        if let Some(max) = section.max_place_candidates {
            if max > 0 {
                scoring.max_place_candidates = max;
            } else {
                warn!("location.max_place_candidates must be at least 1, using default");
            }
        }

        self
    }
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Service-level configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub maptiler_api_key: Option<String>,
    pub fusion: FusionConfig,
}

impl ServiceConfig {
    /// Merge CLI/ENV values (already parsed by clap) over TOML and defaults
    pub fn resolve(cli_port: Option<u16>, cli_bind: Option<String>, toml: &TomlConfig) -> Self {
        let maptiler_api_key = resolve_credential(
            "MapTiler API key",
            &["MAPTILER_API_KEY"],
            &[("maptiler_api_key", toml.maptiler_api_key.as_deref())],
        )
        .map(|c| c.value);

        let max_body_bytes = toml.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);

        // Remote images obey the same ceiling as inline uploads
        let fusion = FusionConfig {
            max_image_bytes: max_body_bytes,
            ..FusionConfig::from_toml(toml)
        };

        Self {
            bind_address: cli_bind
                .or_else(|| toml.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli_port.or(toml.port).unwrap_or(DEFAULT_PORT),
            max_body_bytes,
            maptiler_api_key,
            fusion,
        }
    }
}
