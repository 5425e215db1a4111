//! Marketplace settings loaded from market.toml
//!
//! Every field has a default, so a missing file or an empty table yields the
//! standard behaviour: purchases settle in EUR through PayPal, and statistics
//! reports keep 12 months, 5 top sellers and 10 recent purchases.

use crate::core::{purchase::PurchaseDefaults, statistics::StatisticsLimits};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire market.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Defaults applied to newly recorded purchases
    pub purchases: PurchaseDefaults,
    /// Window sizes for statistics reports
    pub statistics: StatisticsLimits,
}

/// Loads marketplace configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MarketConfig> {
    let path_ref = path.as_ref();
    debug!("Loading marketplace configuration from {:?}", path_ref);

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads configuration from `path` if it exists, otherwise returns defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<MarketConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        info!(
            "No config file at {}, using defaults",
            path.as_ref().display()
        );
        Ok(MarketConfig::default())
    }
}
