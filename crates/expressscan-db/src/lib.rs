//! # expressscan-db: Cart Store Adapter for ExpressScan
//!
//! Persistence and change notification for shopper carts and orders, over
//! SQLite with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ExpressScan Data Flow                             │
//! │                                                                         │
//! │  CartService::apply_offer / adjust_quantity / scan                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 expressscan-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │   │  CartRepo      │   │  (embedded)  │    │   │
//! │  │   │  SqlitePool   │◄──│  OrderRepo     │   │ 001_init.sql │    │   │
//! │  │   └───────────────┘   └───────┬────────┘   └──────────────┘    │   │
//! │  │                               │ committed write                 │   │
//! │  │                       ┌───────▼────────┐                        │   │
//! │  │                       │  CartNotifier  │──► CartSubscription    │   │
//! │  │                       └────────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │          <data dir>/expressscan/expressscan.db                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - `CartStore`, `OrderStore` and `SnapshotSource` traits
//! - [`subscription`] - Per-user cart change feeds
//! - [`repository`] - SQLite implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use expressscan_db::{CartStore, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/expressscan.db")).await?;
//! let mut feed = db.carts().subscribe(&user).await?;
//! let current = feed.next().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;
pub mod subscription;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{CartStore, OrderStore, SnapshotSource};
pub use subscription::{CartNotifier, CartSubscription};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
