//! # Shopper Configuration
//!
//! Store identity, database location, pricing date and offer catalog source.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Load Order (later overrides earlier)                   │
//! │                                                                         │
//! │  1. Defaults          AppConfig::default()                             │
//! │  2. Config file       <config dir>/shopper.toml                        │
//! │  3. Environment       EXPRESSSCAN_DB_PATH, EXPRESSSCAN_UPI_ID,         │
//! │                       EXPRESSSCAN_STORE_NAME, EXPRESSSCAN_OFFERS_PATH  │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shopper.toml
//! [store]
//! name = "ExpressScan Store"
//! upi_id = "expressscan@paytm"
//!
//! [database]
//! path = "/var/lib/expressscan/expressscan.db"
//! max_connections = 5
//!
//! [pricing]
//! as_of = "2025-07-10"   # price as if today were this date
//!
//! [offers]
//! path = "offers.toml"   # built-in launch promotions when unset
//! ```

use chrono::{Local, NaiveDate};
use expressscan_core::offers::OfferCatalog;
use expressscan_core::payment::validate_vpa;
use expressscan_core::{fixtures, CoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "shopper.toml";

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Invalid offer catalog {path}: {source}")]
    Offers {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Store Settings
// =============================================================================

/// The store shoppers pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Payee name shown in the wallet app.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// UPI virtual payment address (`handle@provider`).
    #[serde(default = "default_upi_id")]
    pub upi_id: String,
}

fn default_store_name() -> String {
    "ExpressScan Store".to_string()
}

fn default_upi_id() -> String {
    "yourupiid@paytm".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            upi_id: default_upi_id(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Snapshots buffered per live cart view before it skips ahead.
    #[serde(default = "default_snapshot_capacity")]
    pub snapshot_capacity: usize,
}

fn default_max_connections() -> u32 {
    5
}

fn default_snapshot_capacity() -> usize {
    16
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            snapshot_capacity: default_snapshot_capacity(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Which day offers are judged against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Fixed pricing date. `None` uses the local calendar date.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl PricingSettings {
    pub fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

// =============================================================================
// Offer Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSettings {
    /// TOML offer catalog (`[[offers]]` tables). The built-in launch
    /// promotions are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl OfferSettings {
    /// Loads the configured catalog, or the built-in one.
    pub fn load_catalog(&self) -> ConfigResult<OfferCatalog> {
        let Some(path) = &self.path else {
            debug!("No offer catalog configured, using built-in promotions");
            return Ok(fixtures::offer_catalog());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog =
            OfferCatalog::from_toml_str(&contents).map_err(|source| ConfigError::Offers {
                path: path.clone(),
                source,
            })?;

        info!(?path, offers = catalog.len(), "Offer catalog loaded");
        Ok(catalog)
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete shopper configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub offers: OfferSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shopper config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses one config file without overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }

        validate_vpa(&self.store.upi_id)
            .map_err(|e| ConfigError::Invalid(format!("store.upi_id: {}", e)))?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.snapshot_capacity == 0 {
            return Err(ConfigError::Invalid(
                "database.snapshot_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("EXPRESSSCAN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(upi_id) = lookup("EXPRESSSCAN_UPI_ID") {
            debug!(upi_id = %upi_id, "Overriding UPI id from environment");
            self.store.upi_id = upi_id;
        }

        if let Some(name) = lookup("EXPRESSSCAN_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(path) = lookup("EXPRESSSCAN_OFFERS_PATH") {
            debug!(path = %path, "Overriding offer catalog from environment");
            self.offers.path = Some(PathBuf::from(path));
        }

        if let Some(date) = lookup("EXPRESSSCAN_PRICING_DATE") {
            match date.parse::<NaiveDate>() {
                Ok(d) => self.pricing.as_of = Some(d),
                Err(_) => warn!(date = %date, "Ignoring unparseable pricing date in environment"),
            }
        }
    }

    /// `<platform config dir>/shopper.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "expressscan", "shopper")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
