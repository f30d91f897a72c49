//! # PlanIt Common Library
//!
//! Shared code for PlanIt services:
//! - Error and result types
//! - TOML configuration loading
//! - Credential resolution across environment and config file

pub mod config;
pub mod error;

pub use error::{Error, Result};
