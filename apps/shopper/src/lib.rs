//! # ExpressScan Shopper Library
//!
//! The application layer of the ExpressScan store app: configuration,
//! logging, the signed-in session, the cart services and live pricing.
//!
//! ## Module Organization
//! ```text
//! expressscan_shopper/
//! ├── lib.rs          ◄─── You are here (startup, ShopperApp)
//! ├── config.rs       ◄─── shopper.toml + environment overrides
//! ├── error.rs        ◄─── AppError and its wire form
//! ├── session.rs      ◄─── The signed-in user's opaque id
//! ├── watcher.rs      ◄─── Live repricing of cart snapshots
//! └── services/
//!     ├── cart.rs     ◄─── scan, adjust, remove, view, watch
//!     ├── offers.rs   ◄─── list and apply promotions
//!     └── checkout.rs ◄─── payment link, confirm, history, reorder
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod watcher;

use directories::ProjectDirs;
use expressscan_core::catalog::ProductCatalog;
use expressscan_core::offers::OfferCatalog;
use expressscan_db::{CartRepository, Database, DbConfig, OrderRepository};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, ConfigError, ConfigResult, DatabaseSettings};
use error::AppResult;
use services::{CartService, CheckoutService, OfferService, PricingContext};

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "expressscan.db";

/// Everything the front end talks to, wired to one database.
pub struct ShopperApp {
    db: Database,
    pub carts: CartService<CartRepository>,
    pub offers: OfferService<CartRepository>,
    pub checkout: CheckoutService<CartRepository, OrderRepository>,
}

impl ShopperApp {
    /// Connects to the configured database and builds the services.
    ///
    /// ## Startup Sequence
    /// ```text
    /// 1. Load the offer catalog (file or built-in)
    /// 2. Resolve the database path (config, env, or platform data dir)
    /// 3. Connect, enable WAL, run migrations
    /// 4. Build cart, offer and checkout services over the repositories
    /// ```
    pub async fn start(config: &AppConfig) -> AppResult<Self> {
        let offers = config.offers.load_catalog()?;
        let db_path = database_path(&config.database)?;
        info!(?db_path, "Database path determined");

        let db = Database::new(
            DbConfig::new(db_path)
                .max_connections(config.database.max_connections)
                .snapshot_capacity(config.database.snapshot_capacity),
        )
        .await?;
        info!("Database connected and migrations applied");

        Ok(ShopperApp::with_database(db, config, offers))
    }

    /// Builds the services over an already open database.
    pub fn with_database(db: Database, config: &AppConfig, offers: OfferCatalog) -> Self {
        let pricing = PricingContext::new(offers, config.pricing.clone());

        ShopperApp {
            carts: CartService::new(
                db.carts(),
                ProductCatalog::store_default(),
                pricing.clone(),
            ),
            offers: OfferService::new(db.carts(), pricing.clone()),
            checkout: CheckoutService::new(
                db.carts(),
                db.orders(),
                config.store.clone(),
                pricing,
            ),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ends live cart views and closes the pool.
    pub async fn shutdown(&self) {
        self.db.close().await;
        info!("Shopper app stopped");
    }
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=expressscan=trace` - Trace level for our crates only
/// - Default: INFO level, DEBUG for our crates, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,expressscan=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

/// Resolves the SQLite file.
///
/// ## Priority
/// 1. `database.path` (set by shopper.toml or `EXPRESSSCAN_DB_PATH`)
/// 2. Platform data directory:
///    - macOS: ~/Library/Application Support/com.expressscan.shopper/expressscan.db
///    - Windows: %APPDATA%/expressscan/shopper/data/expressscan.db
///    - Linux: ~/.local/share/shopper/expressscan.db
pub fn database_path(settings: &DatabaseSettings) -> ConfigResult<PathBuf> {
    if let Some(path) = &settings.path {
        return Ok(path.clone());
    }

    let dirs = ProjectDirs::from("com", "expressscan", "shopper").ok_or_else(|| {
        ConfigError::Invalid("Could not determine a data directory".to_string())
    })?;

    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    Ok(data_dir.join(DATABASE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_database_path_wins() {
        let settings = DatabaseSettings {
            path: Some(PathBuf::from("/tmp/expressscan-test.db")),
            ..DatabaseSettings::default()
        };
        assert_eq!(
            database_path(&settings).unwrap(),
            PathBuf::from("/tmp/expressscan-test.db")
        );
    }
}
