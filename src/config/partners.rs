//! Seed configuration loaded from `partners.toml`.
//!
//! The file names the hotel being provisioned and the partners to create on first
//! run. Partners already present (matched by name) are left untouched.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire `partners.toml` file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Hotel the partners belong to
    pub hotel: HotelConfig,
    /// Partners to seed
    #[serde(default)]
    pub partners: Vec<PartnerConfig>,
}

/// The hotel section of the seed file
#[derive(Debug, Deserialize, Clone)]
pub struct HotelConfig {
    /// Hotel name, created if missing
    pub name: String,
}

/// Configuration for a single partner
#[derive(Debug, Deserialize, Clone)]
pub struct PartnerConfig {
    /// Company name
    pub name: String,
    /// Number of employees the partner sponsors
    pub sponsored_employees_count: i32,
    /// Budget shared by the sponsored employees each period
    pub total_shared_amount: Decimal,
    /// Open the first billing period immediately
    #[serde(default)]
    pub start_period: bool,
}

/// Loads the seed configuration from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.as_ref().display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.as_ref().display()),
    })
}

/// Seed file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "partners.toml";

/// Loads the seed configuration from the default location (`./partners.toml`)
pub fn load_default_config() -> Result<SeedConfig> {
    load_config(DEFAULT_CONFIG_PATH)
}
