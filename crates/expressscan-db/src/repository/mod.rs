//! # Repository Module
//!
//! SQLite implementations of the store traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shopper service                                                        │
//! │       │                                                                 │
//! │       │  store.merge_write(&user, &patch)                               │
//! │       ▼                                                                 │
//! │  CartRepository (impl CartStore)                                        │
//! │  ├── get_all(&self, user)                                               │
//! │  ├── merge_write(&self, user, patch)                                    │
//! │  ├── delete(&self, user, barcode)                                       │
//! │  └── subscribe(&self, user)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`](cart::CartRepository) - Cart lines and change feeds
//! - [`OrderRepository`](order::OrderRepository) - Order history

pub mod cart;
pub mod order;
