//! Common error types for PlanIt

use thiserror::Error;

/// Common result type for PlanIt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PlanIt services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML file present but malformed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
