//! Configuration loading and credential resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (handled by each service binary)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: the service logs a warning and starts
//! with defaults. A TOML file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so partial files merge cleanly with defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Address the HTTP server binds to
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Maximum accepted request body size in bytes
    #[serde(default)]
    pub max_body_bytes: Option<usize>,

    /// Gemini (recognition) API key
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Google Places (search) API key
    #[serde(default)]
    pub places_api_key: Option<String>,

    /// Shared Google server key, fallback for both Gemini and Places
    #[serde(default)]
    pub server_api_key: Option<String>,

    /// MapTiler browser key handed to clients
    #[serde(default)]
    pub maptiler_api_key: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Location service tuning
    #[serde(default)]
    pub location: LocationSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info" or "planit_locate=debug,tower_http=info")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[location]` table: overrides for the location fusion engine
///
/// Unset fields fall back to the engine's built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationSection {
    /// Recognition model identifier (e.g. "gemini-1.5-flash")
    #[serde(default)]
    pub model: Option<String>,

    /// Ordered place-type hints tried by the search fan-out
    #[serde(default)]
    pub place_types: Option<Vec<String>>,

    /// Extra tokens appended to every search query
    #[serde(default)]
    pub query_bias_terms: Option<Vec<String>>,

    /// Lower clamp for recognition-only confidence
    #[serde(default)]
    pub recognition_confidence_floor: Option<f64>,

    /// Upper clamp for recognition-only confidence
    #[serde(default)]
    pub recognition_confidence_ceiling: Option<f64>,

    /// Upper clamp for search-derived confidence before the rank penalty
    #[serde(default)]
    pub search_confidence_ceiling: Option<f64>,

    /// Number of search records converted into candidates
    #[serde(default)]
    pub max_place_candidates: Option<usize>,
}

/// Default TOML path for a module: `<config_dir>/planit/<module>.toml`
pub fn default_config_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("planit").join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load TOML configuration with graceful degradation
///
/// Missing file → warning + `TomlConfig::default()`.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Where a resolved credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable with the given name
    Environment(String),
    /// TOML key with the given name
    Toml(String),
    /// Inherited from another resolved credential
    Fallback(String),
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Environment(name) => write!(f, "environment variable {}", name),
            CredentialSource::Toml(key) => write!(f, "TOML key {}", key),
            CredentialSource::Fallback(label) => write!(f, "fallback to {}", label),
        }
    }
}

/// Credential value plus provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub value: String,
    pub source: CredentialSource,
}

/// Resolve a credential from environment variables, then TOML values
///
/// Candidates are checked in the order given; the first valid one wins.
/// Warns when valid but *different* values exist in several sources, since
/// that usually means a stale key somewhere.
pub fn resolve_credential(
    label: &str,
    env_vars: &[&str],
    toml_values: &[(&str, Option<&str>)],
) -> Option<ResolvedCredential> {
    let mut found: Vec<ResolvedCredential> = Vec::new();

    for var in env_vars {
        if let Ok(value) = std::env::var(var) {
            if is_valid_key(&value) {
                found.push(ResolvedCredential {
                    value: value.trim().to_string(),
                    source: CredentialSource::Environment(var.to_string()),
                });
            }
        }
    }

    for (key, value) in toml_values {
        if let Some(value) = value {
            if is_valid_key(value) {
                found.push(ResolvedCredential {
                    value: value.trim().to_string(),
                    source: CredentialSource::Toml(key.to_string()),
                });
            }
        }
    }

    let first = found.first()?.clone();

    if found.iter().any(|c| c.value != first.value) {
        let sources: Vec<String> = found.iter().map(|c| c.source.to_string()).collect();
        warn!(
            "{} found with differing values in: {}. Using {}.",
            label,
            sources.join(", "),
            first.source
        );
    }

    info!("{} loaded from {}", label, first.source);
    Some(first)
}
